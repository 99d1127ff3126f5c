/// Whether redelivering the same message could plausibly succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Retryability {
    /// Transient failure: downstream unavailability, timeout, cancellation.
    Retryable,
    /// Permanent failure: the same payload will fail the same way again.
    NonRetryable,
}

impl Retryability {
    pub fn is_retryable(self) -> bool {
        matches!(self, Retryability::Retryable)
    }
}

/// Failure reported by job construction or execution.
///
/// Every variant has a fixed [`Retryability`]; callers never inspect the
/// message to decide whether to retry.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Downstream unavailable: {0}")]
    Unavailable(String),

    #[error("Downstream timed out: {0}")]
    Timeout(String),

    #[error("Execution cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JobError {
    pub fn retryability(&self) -> Retryability {
        match self {
            JobError::MalformedPayload(_) | JobError::Validation(_) | JobError::Conflict(_) => {
                Retryability::NonRetryable
            }
            JobError::Unavailable(_)
            | JobError::Timeout(_)
            | JobError::Cancelled
            | JobError::Internal(_) => Retryability::Retryable,
        }
    }

    /// Stable machine-readable code, used in logs and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            JobError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            JobError::Validation(_) => "VALIDATION_ERROR",
            JobError::Conflict(_) => "CONFLICT",
            JobError::Unavailable(_) => "UNAVAILABLE",
            JobError::Timeout(_) => "TIMEOUT",
            JobError::Cancelled => "CANCELLED",
            JobError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
