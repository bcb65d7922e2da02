use thiserror::Error;
use vista_model::{ItemId, ResourceStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("operation timed out after {deadline_ms}ms")]
    Timeout { deadline_ms: u64 },

    #[error("operation failed: {0}")]
    Operation(String),

    #[error("invalid `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ResourceStatus,
        to: ResourceStatus,
    },

    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("mutation already pending for {0}")]
    MutationPending(ItemId),

    #[error("resource is not ready (status: {0})")]
    NotReady(ResourceStatus),

    #[error("cancelled")]
    Cancelled,
}

impl CoreError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Timeouts and backend failures can be fixed by trying again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Timeout { .. } | CoreError::Operation(_))
    }

    /// Message shown to the user in an error banner or notification.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Timeout { .. } => {
                "The request took too long to respond. Please try again.".to_string()
            }
            CoreError::Operation(reason) => format!("Could not complete the request: {reason}"),
            CoreError::Validation { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }
}
