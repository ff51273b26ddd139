//! Thread-local ambient context pointer
//!
//! Each thread has its own notion of "the current context". Entering a scope
//! swaps a new handle in and hands back an [`AmbientGuard`]; dropping the
//! guard swaps the previous handle back. Guards are strictly nested on the
//! stack and are neither `Send` nor `Sync`, so a guard can only restore the
//! thread it was created on. Unwinding drops the guard too, which is what
//! keeps a panicking body from leaving a stale context behind.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use super::{Context, ContextId};

thread_local! {
    static AMBIENT: RefCell<Option<Arc<Context>>> = const { RefCell::new(None) };
}

/// The context currently active on this thread
pub(crate) fn current() -> Option<Arc<Context>> {
    AMBIENT.with(|ambient| ambient.borrow().clone())
}

/// Restores the previous ambient context when dropped
pub(crate) struct AmbientGuard {
    previous: Option<Arc<Context>>,
    entered: ContextId,
    _not_send: PhantomData<*const ()>,
}

impl AmbientGuard {
    /// Make `context` ambient on the calling thread
    pub(crate) fn enter(context: Arc<Context>) -> Self {
        let entered = context.id();
        let depth = context.depth();
        let previous = AMBIENT.with(|ambient| ambient.replace(Some(context)));
        tracing::trace!(context = %entered, depth, "entered scope");
        Self {
            previous,
            entered,
            _not_send: PhantomData,
        }
    }
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        // The swapped-out handle is dropped outside the `with` closure: its
        // destructor may run user Drop impls that look at the ambient slot.
        let left = AMBIENT.with(|ambient| ambient.replace(previous));
        tracing::trace!(context = %self.entered, "left scope");
        drop(left);
    }
}
