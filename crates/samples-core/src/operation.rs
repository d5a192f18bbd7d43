//! Waiting on long-running operations
//!
//! [`ExtendedOperation`] is the handle a provider returns for asynchronous
//! work. [`wait_for_extended_operation`] waits once for that handle to finish
//! and turns its terminal state into either the result value or a
//! [`WaitError`]. Warnings are logged and never change the outcome.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{BoxError, WaitError};
use crate::models::{Operation, OperationWarning};

/// Label used in diagnostics when the caller does not provide one
pub const DEFAULT_VERBOSE_NAME: &str = "operation";

/// Default limit for a single wait
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Handle to provider-side asynchronous work
#[async_trait]
pub trait ExtendedOperation: Send {
    /// Value produced when the operation succeeds
    type Output: Send;

    /// Wait until the operation reaches a terminal state and return its result.
    ///
    /// An `Err` here means the provider could not produce a result; the
    /// error code accessors are still consulted afterwards.
    async fn result(&mut self) -> Result<Self::Output, BoxError>;

    /// Operation identifier
    fn name(&self) -> &str;

    /// Error code, if the operation finished with an error
    fn error_code(&self) -> Option<i32>;

    fn error_message(&self) -> Option<&str>;

    /// Take the provider's own error for a failed operation, if it has one
    fn take_exception(&mut self) -> Option<BoxError>;

    /// Non-fatal warnings reported by the operation
    fn warnings(&self) -> &[OperationWarning];
}

/// Wait for `operation` to complete and return its result.
///
/// `timeout` of `None` waits indefinitely. Exactly one wait-and-check cycle
/// is performed; nothing is retried.
pub async fn wait_for_extended_operation<O>(
    operation: &mut O,
    verbose_name: &str,
    timeout: Option<Duration>,
) -> Result<O::Output, WaitError>
where
    O: ExtendedOperation + ?Sized,
{
    let operation_id = operation.name().to_string();
    let result = match timeout {
        Some(limit) => tokio::time::timeout(limit, operation.result())
            .await
            .map_err(|_| {
                tracing::error!(
                    operation = %verbose_name,
                    operation_id = %operation_id,
                    timeout = ?limit,
                    "Timed out waiting for operation"
                );
                WaitError::Timeout {
                    operation: verbose_name.to_string(),
                    timeout: limit,
                }
            })?,
        None => operation.result().await,
    };

    if let Some(code) = operation.error_code() {
        let message = operation.error_message().unwrap_or_default().to_string();
        tracing::error!(
            operation = %verbose_name,
            code,
            error_message = %message,
            operation_id = %operation_id,
            "Error during operation"
        );

        return Err(match operation.take_exception() {
            Some(source) => WaitError::Failed {
                operation: verbose_name.to_string(),
                source,
            },
            None => WaitError::Runtime {
                operation: verbose_name.to_string(),
                code,
                message,
            },
        });
    }

    let warnings = operation.warnings();
    if !warnings.is_empty() {
        tracing::warn!(
            operation = %verbose_name,
            count = warnings.len(),
            "Warnings during operation"
        );
        for warning in warnings {
            tracing::warn!(
                operation_id = %operation_id,
                warning_code = %warning.code,
                warning_message = %warning.message,
                "Operation warning"
            );
        }
    }

    result.map_err(|source| WaitError::Failed {
        operation: verbose_name.to_string(),
        source,
    })
}

/// Provider endpoint that reports the current state of an operation
#[async_trait]
pub trait OperationSource<T>: Send + Sync {
    async fn get_operation(&self, name: &str) -> Result<Operation<T>, BoxError>;
}

/// An [`ExtendedOperation`] that polls an [`OperationSource`] until done
pub struct PollingOperation<T> {
    source: Arc<dyn OperationSource<T>>,
    current: Operation<T>,
    poll_interval: Duration,
}

impl<T> PollingOperation<T>
where
    T: Send + Sync + 'static,
{
    /// Default delay between two polls
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Start tracking `initial`, the snapshot returned when the work was submitted
    pub fn new(source: Arc<dyn OperationSource<T>>, initial: Operation<T>) -> Self {
        Self {
            source,
            current: initial,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Latest snapshot seen
    pub fn current(&self) -> &Operation<T> {
        &self.current
    }
}

#[async_trait]
impl<T> ExtendedOperation for PollingOperation<T>
where
    T: Send + Sync + 'static,
{
    type Output = T;

    async fn result(&mut self) -> Result<T, BoxError> {
        let mut first = true;
        while !self.current.is_done() {
            if !first {
                tokio::time::sleep(self.poll_interval).await;
            }
            first = false;

            self.current = self.source.get_operation(&self.current.name).await?;
            tracing::debug!(
                operation_id = %self.current.name,
                status = ?self.current.status,
                "Polled operation"
            );
        }

        self.current.result.take().ok_or_else(|| {
            BoxError::from(format!(
                "operation {} finished without a result",
                self.current.name
            ))
        })
    }

    fn name(&self) -> &str {
        &self.current.name
    }

    fn error_code(&self) -> Option<i32> {
        self.current.error.as_ref().map(|e| e.code)
    }

    fn error_message(&self) -> Option<&str> {
        self.current.error.as_ref().map(|e| e.message.as_str())
    }

    fn take_exception(&mut self) -> Option<BoxError> {
        None
    }

    fn warnings(&self) -> &[OperationWarning] {
        &self.current.warnings
    }
}
