//! Common error types for operation waiting and compute workflows

use std::time::Duration;

use thiserror::Error;

/// Boxed error as reported by an operation provider
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for compute backend calls
pub type ComputeResult<T> = Result<T, ComputeError>;

/// Errors returned by [`wait_for_extended_operation`](crate::wait_for_extended_operation)
#[derive(Debug, Error)]
pub enum WaitError {
    /// The operation did not reach a terminal state in time
    #[error("Timed out waiting for {operation} after {timeout:?}")]
    Timeout {
        /// Verbose name of the operation
        operation: String,
        /// The limit that was exceeded
        timeout: Duration,
    },

    /// The operation failed and the provider supplied its own error
    #[error("Error during {operation}: {source}")]
    Failed {
        /// Verbose name of the operation
        operation: String,
        #[source]
        source: BoxError,
    },

    /// The operation carried an error code but no provider error
    #[error("Error during {operation}: [Code: {code}]: {message}")]
    Runtime {
        /// Verbose name of the operation
        operation: String,
        /// Error code reported by the operation
        code: i32,
        /// Error message reported by the operation
        message: String,
    },
}

impl WaitError {
    /// Returns true if the wait itself ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }
}

/// Errors that can occur in compute backends
#[derive(Debug, Error)]
pub enum ComputeError {
    /// Snapshot, image, or operation not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid parameter or request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backend/communication error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Waiting on a long-running operation failed
    #[error(transparent)]
    Wait(#[from] WaitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_message() {
        let err = WaitError::Runtime {
            operation: "image creation".to_string(),
            code: 400,
            message: "bad request".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error during image creation: [Code: 400]: bad request"
        );
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_failed_error_keeps_source() {
        use std::error::Error as _;

        let source: BoxError = "quota exceeded".into();
        let err = WaitError::Failed {
            operation: "operation".to_string(),
            source,
        };
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_wait_error_converts_transparently() {
        let err = ComputeError::from(WaitError::Timeout {
            operation: "image creation from snapshot".to_string(),
            timeout: Duration::from_secs(1),
        });
        assert!(matches!(err, ComputeError::Wait(ref wait) if wait.is_timeout()));
        assert!(err.to_string().contains("image creation from snapshot"));
    }
}
