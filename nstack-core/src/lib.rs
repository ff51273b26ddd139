//! # NStack Core - Scoped Service Registry
//!
//! NStack lets code register implementations of service contracts inside a
//! dynamically nested scope, and lets anything running inside that scope
//! (or a nested one) resolve the nearest registration:
//!
//! - **Scopes** nest like the call stack: [`Context::create`] pushes a scope,
//!   runs a body and pops it again, even if the body panics
//! - **Registrations** are write-once per contract per scope; a child scope
//!   may shadow a parent's binding for its own lifetime
//! - **Continuations** carry a captured scope chain to another thread or
//!   async task, so deferred work resolves exactly as it would have at the
//!   point of capture
//!
//! ## Core Principle
//!
//! > The nearest scope wins, and leaving a scope always undoes it.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use nstack_core::{Context, ScopeError};
//!
//! trait Logger: Send + Sync {
//!     fn warning(&self, message: &str) -> String;
//! }
//!
//! struct Console;
//! impl Logger for Console {
//!     fn warning(&self, message: &str) -> String {
//!         format!("[warning]: {}", message)
//!     }
//! }
//!
//! // Outside any scope there is nothing to resolve from
//! assert!(matches!(
//!     Context::resolve::<dyn Logger>(),
//!     Err(ScopeError::OutOfContext { .. })
//! ));
//!
//! let worker = Context::create(|| {
//!     Context::register::<dyn Logger>(Arc::new(Console)).unwrap();
//!
//!     // Preserve the scope for another thread
//!     let job = Context::save(|| {
//!         Context::resolve::<dyn Logger>().unwrap().warning("from new thread")
//!     })
//!     .unwrap();
//!     std::thread::spawn(job.into_fn())
//! });
//!
//! assert_eq!(worker.join().unwrap(), "[warning]: from new thread");
//! ```

pub mod context;
pub mod continuation;
pub mod contract;
pub mod error;
pub mod inspect;
pub mod scoped;

#[cfg(feature = "async-runtime")]
pub mod runtime;

// Re-export main types
pub use context::{
    Ancestors, Context, ContextHandle, ContextId, Registration, RegistrationKind, ScopeBuilder,
    ServiceInfo,
};
pub use continuation::Continuation;
pub use contract::ContractId;
pub use error::{ErrorCategory, ErrorDetail, ErrorResponse, Result, ScopeError};
pub use inspect::ContextInfo;
pub use scoped::Scoped;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Logger: Send + Sync {
        fn tag(&self) -> &'static str;
    }

    struct L1;
    impl Logger for L1 {
        fn tag(&self) -> &'static str {
            "L1"
        }
    }

    struct L2;
    impl Logger for L2 {
        fn tag(&self) -> &'static str {
            "L2"
        }
    }

    fn logger_tag() -> &'static str {
        Context::resolve::<dyn Logger>().unwrap().tag()
    }

    #[test]
    fn test_full_workflow() {
        let captured = Context::create(|| {
            Context::register::<dyn Logger>(Arc::new(L1)).unwrap();
            assert_eq!(logger_tag(), "L1");

            // Captured before the child scope opens
            let captured = Context::save(logger_tag).unwrap();

            Context::create(|| {
                assert_eq!(logger_tag(), "L1");
                Context::register::<dyn Logger>(Arc::new(L2)).unwrap();
                assert_eq!(logger_tag(), "L2");
            });

            assert_eq!(logger_tag(), "L1");
            captured
        });

        // The root scope has exited on this thread; the capture keeps it alive.
        assert!(Context::current().is_none());
        let tag = std::thread::spawn(captured.into_fn()).join().unwrap();
        assert_eq!(tag, "L1");
    }
}
