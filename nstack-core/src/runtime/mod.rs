//! # Tokio integration
//!
//! Optional helpers for handing work to a tokio runtime without losing the
//! ambient context chain. Enable with the `async-runtime` feature.
//!
//! - **spawn_scoped**: `tokio::spawn` a future that resolves against the
//!   context captured at spawn time, whichever worker polls it
//! - **spawn_blocking_scoped**: run a synchronous body on the blocking pool
//!   under the captured context
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nstack_core::{runtime, Context};
//!
//! #[tokio::main]
//! async fn main() -> nstack_core::Result<()> {
//!     let handle = Context::create(|| {
//!         Context::register::<String>(Arc::new("tenant-a".to_string()))?;
//!         runtime::spawn_scoped(async { Context::resolve::<String>() })
//!     })?;
//!
//!     assert_eq!(*handle.await.unwrap()?, "tenant-a");
//!     Ok(())
//! }
//! ```

use std::future::Future;

use tokio::task::JoinHandle;

use crate::context::Context;
use crate::error::Result;

/// Spawn `future` on the current tokio runtime under the ambient context
///
/// Fails with `OutOfContext` when nothing is ambient. Must be called from
/// within a tokio runtime.
pub fn spawn_scoped<F>(future: F) -> Result<JoinHandle<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let scoped = Context::save_future(future)?;
    Ok(tokio::spawn(scoped))
}

/// Run `body` on tokio's blocking pool under the ambient context
pub fn spawn_blocking_scoped<F, R>(body: F) -> Result<JoinHandle<R>>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let continuation = Context::save(body)?;
    Ok(tokio::task::spawn_blocking(continuation.into_fn()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::error::ScopeError;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawn_scoped_resolves_captured_chain() {
        let handle = Context::create(|| {
            Context::register::<String>(Arc::new("tenant-a".to_string())).unwrap();
            spawn_scoped(async {
                tokio::task::yield_now().await;
                Context::resolve::<String>().map(|s| s.to_string())
            })
            .unwrap()
        });

        assert_eq!(handle.await.unwrap().unwrap(), "tenant-a");
    }

    #[tokio::test]
    async fn test_spawn_blocking_scoped() {
        let handle = Context::create(|| {
            Context::register::<u64>(Arc::new(99)).unwrap();
            spawn_blocking_scoped(|| *Context::resolve::<u64>().unwrap()).unwrap()
        });

        assert_eq!(handle.await.unwrap(), 99);
    }

    #[tokio::test]
    async fn test_spawn_outside_scope() {
        let err = spawn_scoped(async {}).err().unwrap();
        assert_eq!(err, ScopeError::OutOfContext { operation: "save" });
    }
}
