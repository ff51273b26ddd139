//! Deferred units of work bound to a captured context chain
//!
//! [`Context::save`] captures whatever is ambient and pairs it with a body.
//! When the resulting [`Continuation`] runs, possibly on another thread and
//! possibly long after the capturing scope has returned, it opens a fresh
//! child of the captured context and runs the body there. Resolution sees
//! the captured chain, shadowing included; registrations made by the body
//! stay in that child. The executing thread's own ambient context is
//! restored when the body finishes.
//!
//! ```rust
//! use std::sync::Arc;
//! use nstack_core::Context;
//!
//! let handle = Context::create(|| {
//!     Context::register::<String>(Arc::new("captured".to_string())).unwrap();
//!     let job = Context::save(|| Context::resolve::<String>().unwrap()).unwrap();
//!     std::thread::spawn(job.into_fn())
//! });
//!
//! assert_eq!(*handle.join().unwrap(), "captured");
//! ```

use std::fmt;
use std::thread::{self, JoinHandle};

use crate::context::{Context, ContextHandle};
use crate::error::{Result, ScopeError};

/// A body bound to a captured context
#[must_use = "a continuation does nothing until it is run"]
pub struct Continuation<F> {
    context: ContextHandle,
    body: F,
}

impl<F> Continuation<F> {
    pub(crate) fn new(context: ContextHandle, body: F) -> Self {
        Self { context, body }
    }

    /// The captured context
    pub fn context(&self) -> &ContextHandle {
        &self.context
    }

    /// Run the body under the captured chain
    pub fn run<R>(self) -> R
    where
        F: FnOnce() -> R,
    {
        let Continuation { context, body } = self;
        tracing::debug!(
            context = %context.id(),
            thread = thread::current().name().unwrap_or("<unnamed>"),
            "running continuation"
        );
        context.enter(body)
    }

    /// Run a body that takes an argument, under the captured chain
    pub fn run_with<A, R>(self, arg: A) -> R
    where
        F: FnOnce(A) -> R,
    {
        let Continuation { context, body } = self;
        tracing::debug!(
            context = %context.id(),
            thread = thread::current().name().unwrap_or("<unnamed>"),
            "running continuation"
        );
        context.enter(move || body(arg))
    }

    /// Turn the continuation into a plain closure, e.g. for `thread::spawn`
    pub fn into_fn<R>(self) -> impl FnOnce() -> R
    where
        F: FnOnce() -> R,
    {
        move || self.run()
    }
}

impl<F> fmt::Debug for Continuation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("context", &self.context.id())
            .finish_non_exhaustive()
    }
}

/// Capture the ambient context and run `body` on a new thread under it
pub fn spawn<F, R>(body: F) -> Result<JoinHandle<R>>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let continuation = Context::save(body)?;
    Ok(thread::spawn(continuation.into_fn()))
}

/// Like [`spawn`], with a thread name
pub fn spawn_named<F, R>(name: impl Into<String>, body: F) -> Result<JoinHandle<R>>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let continuation = Context::save(body)?;
    thread::Builder::new()
        .name(name.into())
        .spawn(continuation.into_fn())
        .map_err(|e| ScopeError::Spawn {
            reason: e.to_string(),
        })
}
