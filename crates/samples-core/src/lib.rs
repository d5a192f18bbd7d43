//! samples-core - Long-running operation helpers for the cloud samples
//!
//! This crate provides the operation waiter used by the samples, a polling
//! operation handle, and the image-from-snapshot workflow built on top of an
//! abstract compute backend.

pub mod compute;
pub mod error;
pub mod mock;
pub mod models;
pub mod operation;

pub use compute::{create_image_from_snapshot, ComputeBackend, CreateImageOptions};
pub use error::{BoxError, ComputeError, ComputeResult, WaitError};
pub use mock::InMemoryCompute;
pub use models::*;
pub use operation::{
    wait_for_extended_operation, ExtendedOperation, OperationSource, PollingOperation,
    DEFAULT_OPERATION_TIMEOUT, DEFAULT_VERBOSE_NAME,
};
