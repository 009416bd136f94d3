//! Unified error handling for nrlambda-core
//!
//! Only conditions that stop a workflow are errors. A remote operation that
//! answers "no" is a step outcome (see [`crate::report::StepOutcome`]), not a
//! `CoreError`.
//!
//! # Example
//!
//! ```rust
//! use nrlambda_core::CoreError;
//!
//! let err = CoreError::AuthenticationFailed {
//!     message: "invalid API key".to_string(),
//! };
//! assert!(err.is_unauthorized());
//! assert!(err.is_precondition());
//! ```

use thiserror::Error;

/// Core error type for integration workflows
#[derive(Error, Debug)]
pub enum CoreError {
    /// New Relic rejected the supplied credentials
    #[error("New Relic authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The AWS principal lacks permissions required by the workflow
    #[error("Insufficient AWS permissions, missing: {}", missing.join(", "))]
    PermissionDenied { missing: Vec<String> },

    /// A linked account with the requested name belongs to another AWS account
    #[error(
        "Linked account '{name}' is bound to AWS account {linked_aws_account}, \
         but the current AWS session belongs to {session_aws_account}"
    )]
    LinkedAccountMismatch {
        name: String,
        linked_aws_account: String,
        session_aws_account: String,
    },

    /// NerdGraph returned a malformed or error response
    #[error("NerdGraph error: {0}")]
    GraphQl(String),

    /// HTTP transport failure talking to New Relic
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The AWS CLI exited unsuccessfully
    #[error("aws {command} failed: {message}")]
    AwsCli { command: String, message: String },

    /// Failure spawning or talking to a child process
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected response shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (e.g., invalid workflow parameters)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if New Relic rejected the credentials
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CoreError::AuthenticationFailed { .. } => true,
            CoreError::Http(e) => e
                .status()
                .is_some_and(|s| s.as_u16() == 401 || s.as_u16() == 403),
            _ => false,
        }
    }

    /// Returns true if this error is raised before any resource is mutated
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CoreError::AuthenticationFailed { .. }
                | CoreError::PermissionDenied { .. }
                | CoreError::LinkedAccountMismatch { .. }
                | CoreError::Validation(_)
                | CoreError::Config(_)
        )
    }

    /// Returns true if this is an unexpected remote or process failure
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CoreError::Http(_) | CoreError::AwsCli { .. } | CoreError::Io(_) | CoreError::GraphQl(_)
        )
    }
}
