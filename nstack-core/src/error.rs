//! Error types for NStack operations
//!
//! Every failure the engine reports is a caller fault: the operation was
//! invoked in the wrong place (no ambient context), twice (duplicate
//! registration), or for something nobody provided (irresolvable service).
//! None of them are retried or recovered internally.
//!
//! Each variant carries:
//! - A human-readable message naming the offending contract where one applies
//! - A stable error code for programmatic handling
//! - A category for grouping
//!
//! # Example
//!
//! ```rust
//! use nstack_core::{Context, ErrorCategory};
//!
//! trait Clock: Send + Sync {}
//!
//! let err = Context::resolve::<dyn Clock>().err().unwrap();
//! assert_eq!(err.error_code(), "OUT_OF_CONTEXT");
//! assert_eq!(err.category(), ErrorCategory::State);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for NStack operations
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The calling thread is not inside a scope
    State,
    /// A contract is already bound in the scope
    Conflict,
    /// No scope in the chain provides the contract
    NotFound,
    /// Failure outside the engine's contract (thread spawning)
    Internal,
}

/// Errors raised by the context chain engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// An operation that needs an ambient context ran outside of any scope
    #[error("There is no context defined for the current call; '{operation}' must run inside Context::create.")]
    OutOfContext { operation: &'static str },

    /// The contract already has an entry in the ambient context
    #[error("The service '{contract}' is already registered in the current context.")]
    DuplicateRegistration { contract: &'static str },

    /// No context from the ambient node up to the root provides the contract
    #[error("The service '{contract}' is not registered in the current context.")]
    IrresolvableService { contract: &'static str },

    /// A continuation thread could not be started
    #[error("Failed to spawn continuation thread: {reason}")]
    Spawn { reason: String },
}

impl ScopeError {
    pub(crate) fn out_of_context(operation: &'static str) -> Self {
        ScopeError::OutOfContext { operation }
    }

    /// Returns true if this error might succeed on retry
    ///
    /// Only thread spawn failures qualify; the others are caller faults that
    /// fail the same way every time.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScopeError::Spawn { .. })
    }

    /// Returns the contract name this error is about, if any
    pub fn target_service(&self) -> Option<&'static str> {
        match self {
            ScopeError::DuplicateRegistration { contract }
            | ScopeError::IrresolvableService { contract } => Some(contract),
            ScopeError::OutOfContext { .. } | ScopeError::Spawn { .. } => None,
        }
    }

    /// Returns the error category for grouping
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScopeError::OutOfContext { .. } => ErrorCategory::State,
            ScopeError::DuplicateRegistration { .. } => ErrorCategory::Conflict,
            ScopeError::IrresolvableService { .. } => ErrorCategory::NotFound,
            ScopeError::Spawn { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ScopeError::OutOfContext { .. } => "OUT_OF_CONTEXT",
            ScopeError::DuplicateRegistration { .. } => "DUPLICATE_REGISTRATION",
            ScopeError::IrresolvableService { .. } => "IRRESOLVABLE_SERVICE",
            ScopeError::Spawn { .. } => "SPAWN_FAILED",
        }
    }

    /// Converts this error to a JSON-serializable response object
    ///
    /// ```json
    /// {
    ///   "error": {
    ///     "code": "IRRESOLVABLE_SERVICE",
    ///     "message": "The service 'dyn app::Logger' is not registered...",
    ///     "category": "not_found",
    ///     "service": "dyn app::Logger",
    ///     "recoverable": false
    ///   }
    /// }
    /// ```
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
                service: self.target_service().map(str::to_string),
                recoverable: self.is_recoverable(),
            },
        }
    }
}

/// JSON-serializable error envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail for JSON output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error code (e.g., "OUT_OF_CONTEXT")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Error category
    pub category: ErrorCategory,
    /// Contract the error refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Whether retry might succeed
    pub recoverable: bool,
}
