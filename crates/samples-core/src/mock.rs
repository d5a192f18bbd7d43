//! In-memory compute backend for testing and demos

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::compute::{ComputeBackend, InsertOperation};
use crate::error::{BoxError, ComputeError, ComputeResult};
use crate::models::{Image, ImageRequest, Operation, OperationStatus, OperationWarning, Snapshot};
use crate::operation::{OperationSource, PollingOperation};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// An insert that has not finished yet
struct PendingInsert {
    operation: Operation<String>,
    project: String,
    image: Image,
    failure: Option<(i32, String)>,
    polls_remaining: u32,
}

/// Scripted outcome for the next insert
#[derive(Default)]
struct NextInsert {
    failure: Option<(i32, String)>,
    warnings: Vec<OperationWarning>,
}

#[derive(Default)]
struct Inner {
    snapshots: RwLock<HashMap<(String, String), Snapshot>>,
    images: RwLock<HashMap<(String, String), Image>>,
    operations: Mutex<HashMap<String, PendingInsert>>,
    next_insert: Mutex<NextInsert>,
}

impl Inner {
    /// Move an insert to its terminal state; the image is stored only on success
    fn finish(&self, pending: PendingInsert) -> Operation<String> {
        let PendingInsert {
            mut operation,
            project,
            image,
            failure,
            ..
        } = pending;

        match failure {
            Some((code, message)) => operation.fail(code, message),
            None => {
                operation.complete(image.self_link.clone());
                self.images
                    .write()
                    .insert((project, image.name.clone()), image);
            }
        }
        operation
    }
}

#[async_trait]
impl OperationSource<String> for Inner {
    async fn get_operation(&self, name: &str) -> Result<Operation<String>, BoxError> {
        let mut operations = self.operations.lock();
        if let Some(pending) = operations.get_mut(name) {
            if pending.polls_remaining > 0 {
                pending.polls_remaining -= 1;
                pending.operation.status = OperationStatus::Running;
                return Ok(pending.operation.clone());
            }
        }

        // Finished inserts are dropped from the table
        let pending = operations
            .remove(name)
            .ok_or_else(|| BoxError::from(format!("operation not found: {}", name)))?;
        Ok(self.finish(pending))
    }
}

/// Compute backend that keeps snapshots, images and operations in memory.
///
/// Inserts finish after a configurable number of polls. Failures and warnings
/// can be scripted for the next insert.
#[derive(Default)]
pub struct InMemoryCompute {
    inner: Arc<Inner>,
    polls_until_done: u32,
}

impl InMemoryCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of polls an insert stays running before it finishes
    pub fn with_polls_until_done(mut self, polls: u32) -> Self {
        self.polls_until_done = polls;
        self
    }

    pub fn add_snapshot(&self, project: &str, name: &str) -> Snapshot {
        let snapshot = Snapshot::new(project, name);
        self.inner
            .snapshots
            .write()
            .insert((project.to_string(), name.to_string()), snapshot.clone());
        snapshot
    }

    /// Make the next insert finish with an error
    pub fn fail_next_insert(&self, code: i32, message: impl Into<String>) {
        self.inner.next_insert.lock().failure = Some((code, message.into()));
    }

    /// Attach a warning to the next insert
    pub fn warn_next_insert(&self, warning: OperationWarning) {
        self.inner.next_insert.lock().warnings.push(warning);
    }
}

#[async_trait]
impl ComputeBackend for InMemoryCompute {
    async fn get_snapshot(&self, project: &str, snapshot: &str) -> ComputeResult<Snapshot> {
        self.inner
            .snapshots
            .read()
            .get(&(project.to_string(), snapshot.to_string()))
            .cloned()
            .ok_or_else(|| {
                ComputeError::NotFound(format!("projects/{}/snapshots/{}", project, snapshot))
            })
    }

    async fn insert_image(
        &self,
        project: &str,
        image: ImageRequest,
    ) -> ComputeResult<InsertOperation> {
        if image.name.is_empty() {
            return Err(ComputeError::InvalidRequest(
                "image name must not be empty".to_string(),
            ));
        }
        if self
            .inner
            .images
            .read()
            .contains_key(&(project.to_string(), image.name.clone()))
        {
            return Err(ComputeError::InvalidRequest(format!(
                "image already exists: {}",
                image.name
            )));
        }

        let NextInsert { failure, warnings } = std::mem::take(&mut *self.inner.next_insert.lock());

        let name = format!("operation-{}", uuid::Uuid::new_v4());
        let mut operation = Operation::pending(&name);
        operation.warnings = warnings;

        tracing::debug!(operation_id = %name, image = %image.name, "Accepted image insert");

        self.inner.operations.lock().insert(
            name.clone(),
            PendingInsert {
                operation: operation.clone(),
                project: project.to_string(),
                image: Image::from_request(project, image),
                failure,
                polls_remaining: self.polls_until_done,
            },
        );

        let source: Arc<dyn OperationSource<String>> = self.inner.clone();
        Ok(Box::new(
            PollingOperation::new(source, operation).with_poll_interval(POLL_INTERVAL),
        ))
    }

    async fn get_image(&self, project: &str, image: &str) -> ComputeResult<Image> {
        self.inner
            .images
            .read()
            .get(&(project.to_string(), image.to_string()))
            .cloned()
            .ok_or_else(|| ComputeError::NotFound(format!("projects/{}/images/{}", project, image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ExtendedOperation;

    #[tokio::test]
    async fn test_insert_completes_after_polls() {
        let compute = InMemoryCompute::new().with_polls_until_done(1);
        let mut op = compute
            .insert_image("p", ImageRequest::new("img", "link"))
            .await
            .unwrap();

        assert!(compute.get_image("p", "img").await.is_err());
        let link = op.result().await.unwrap();
        assert!(link.ends_with("/projects/p/global/images/img"));
        assert!(compute.get_image("p", "img").await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_image_rejected() {
        let compute = InMemoryCompute::new();
        let mut op = compute
            .insert_image("p", ImageRequest::new("img", "link"))
            .await
            .unwrap();
        op.result().await.unwrap();

        let err = compute
            .insert_image("p", ImageRequest::new("img", "link"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ComputeError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_scripted_failure_applies_once() {
        let compute = InMemoryCompute::new();
        compute.fail_next_insert(503, "unavailable");

        let mut first = compute
            .insert_image("p", ImageRequest::new("a", "link"))
            .await
            .unwrap();
        assert!(first.result().await.is_err());
        assert_eq!(first.error_code(), Some(503));

        let mut second = compute
            .insert_image("p", ImageRequest::new("b", "link"))
            .await
            .unwrap();
        assert!(second.result().await.is_ok());
        assert_eq!(second.error_code(), None);
    }

    #[tokio::test]
    async fn test_failed_insert_is_finished_and_dropped() {
        let compute = InMemoryCompute::new();
        compute.fail_next_insert(409, "conflict");

        let op = compute
            .insert_image("p", ImageRequest::new("a", "link"))
            .await
            .unwrap();
        let name = op.name().to_string();

        let finished = compute.inner.get_operation(&name).await.unwrap();
        assert!(finished.is_done());
        assert!(finished.completed_at.is_some());
        assert_eq!(finished.error.as_ref().map(|e| e.code), Some(409));
        assert!(finished.result.is_none());
        assert!(compute.get_image("p", "a").await.is_err());

        assert!(compute.inner.operations.lock().is_empty());
        assert!(compute.inner.get_operation(&name).await.is_err());
    }

    #[tokio::test]
    async fn test_running_insert_stays_tracked() {
        let compute = InMemoryCompute::new().with_polls_until_done(2);
        let op = compute
            .insert_image("p", ImageRequest::new("a", "link"))
            .await
            .unwrap();

        let running = compute.inner.get_operation(op.name()).await.unwrap();
        assert_eq!(running.status, OperationStatus::Running);
        assert!(running.completed_at.is_none());
        assert_eq!(compute.inner.operations.lock().len(), 1);
    }
}
