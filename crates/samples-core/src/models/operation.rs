//! Long-running operation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a long-running operation as reported by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation<T> {
    /// Operation identifier
    pub name: String,
    /// Current status
    pub status: OperationStatus,
    /// Error reported when the operation finished unsuccessfully
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrorInfo>,
    /// Non-fatal warnings collected during execution
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<OperationWarning>,
    /// Result value (if completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// When the operation was created
    pub created_at: DateTime<Utc>,
    /// When the operation reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Status of a long-running operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Operation is queued
    Pending,
    /// Operation is currently running
    Running,
    /// Operation reached a terminal state (successfully or not)
    Done,
}

/// Error details attached to a finished operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorInfo {
    /// Provider error code (HTTP status for compute operations)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
}

/// A non-fatal warning reported by an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationWarning {
    /// Warning code, e.g. `DEPRECATED_RESOURCE_USED`
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl OperationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl<T> Operation<T> {
    /// Create a new pending operation
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: OperationStatus::Pending,
            error: None,
            warnings: Vec::new(),
            result: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Create a completed operation with result
    pub fn done(name: impl Into<String>, result: T) -> Self {
        let mut op = Self::pending(name);
        op.complete(result);
        op
    }

    /// Create a finished operation that carries an error
    pub fn failed(name: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        let mut op = Self::pending(name);
        op.fail(code, message);
        op
    }

    /// Attach a warning
    pub fn with_warning(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.warnings.push(OperationWarning::new(code, message));
        self
    }

    /// Mark the operation as done with the given result
    pub fn complete(&mut self, result: T) {
        self.status = OperationStatus::Done;
        self.result = Some(result);
        self.completed_at = Some(Utc::now());
    }

    /// Mark the operation as done with an error
    pub fn fail(&mut self, code: i32, message: impl Into<String>) {
        self.status = OperationStatus::Done;
        self.error = Some(OperationErrorInfo {
            code,
            message: message.into(),
        });
        self.completed_at = Some(Utc::now());
    }

    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }
}
