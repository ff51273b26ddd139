//! Futures that carry a captured context chain
//!
//! Thread-local ambient state does not follow an async task: a work-stealing
//! executor may poll the same task on a different worker every time. A
//! [`Scoped`] future fixes that by making its context ambient around each
//! individual `poll` and restoring the worker's previous ambient value right
//! after.
//!
//! The context entered on every poll is a single child of the captured
//! context, created when the future is wrapped, so registrations made by the
//! task survive across `.await` points but never leak into the captured
//! scope.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use crate::context::{AmbientGuard, Context, ContextHandle};

/// A future polled under a captured context chain
#[must_use = "futures do nothing unless polled"]
pub struct Scoped<F> {
    context: ContextHandle,
    inner: Pin<Box<F>>,
}

impl<F> Scoped<F> {
    pub(crate) fn new(captured: ContextHandle, future: F) -> Self {
        Self {
            context: Context::new(Some(captured), None),
            inner: Box::pin(future),
        }
    }

    /// The task's own context (a child of the captured one)
    pub fn context(&self) -> &ContextHandle {
        &self.context
    }
}

impl<F: Future> Future for Scoped<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let _guard = AmbientGuard::enter(Arc::clone(&this.context));
        this.inner.as_mut().poll(cx)
    }
}

impl<F> fmt::Debug for Scoped<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scoped")
            .field("context", &self.context.id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolves_across_awaits_on_worker_threads() {
        let task = Context::create(|| {
            Context::register::<String>(Arc::new("outer".to_string())).unwrap();
            Context::save_future(async {
                let mut seen = Vec::new();
                for _ in 0..8 {
                    seen.push(Context::resolve::<String>().unwrap());
                    tokio::task::yield_now().await;
                }
                seen
            })
            .unwrap()
        });

        let seen = tokio::spawn(task).await.unwrap();
        assert_eq!(seen.len(), 8);
        assert!(seen.iter().all(|s| s.as_str() == "outer"));
    }

    #[tokio::test]
    async fn test_task_registrations_persist_between_polls() {
        let (task, captured) = Context::create(|| {
            let captured = Context::capture().unwrap();
            let task = Context::save_future(async {
                Context::register::<u16>(Arc::new(5)).unwrap();
                tokio::task::yield_now().await;
                *Context::resolve::<u16>().unwrap()
            })
            .unwrap();
            (task, captured)
        });

        assert_eq!(task.await, 5);
        assert!(!captured.contains::<u16>());
    }

    #[tokio::test]
    async fn test_poll_leaves_ambient_untouched() {
        assert!(Context::current().is_none());
        let task = Context::create(|| Context::save_future(async { 1 + 1 }).unwrap());
        assert_eq!(task.await, 2);
        assert!(Context::current().is_none());
    }
}
