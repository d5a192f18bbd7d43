//! Image creation from a disk snapshot
//!
//! [`ComputeBackend`] is the seam to the compute provider. The workflow in
//! [`create_image_from_snapshot`] fetches the snapshot, inserts the image,
//! waits for the insert operation and returns the stored image.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ComputeResult;
use crate::models::{Image, ImageRequest, Snapshot};
use crate::operation::{wait_for_extended_operation, ExtendedOperation, DEFAULT_OPERATION_TIMEOUT};

/// Operation handle returned by image inserts; resolves to the image link
pub type InsertOperation = Box<dyn ExtendedOperation<Output = String>>;

/// Compute provider operations used by the samples
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Fetch a snapshot by name
    async fn get_snapshot(&self, project: &str, snapshot: &str) -> ComputeResult<Snapshot>;

    /// Start inserting an image
    async fn insert_image(&self, project: &str, image: ImageRequest)
        -> ComputeResult<InsertOperation>;

    /// Fetch an image by name
    async fn get_image(&self, project: &str, image: &str) -> ComputeResult<Image>;
}

/// Optional settings for [`create_image_from_snapshot`]
#[derive(Debug, Clone)]
pub struct CreateImageOptions {
    /// Project hosting the snapshot; defaults to the target project
    pub source_project_id: Option<String>,
    /// Guest OS features to enable on the image
    pub guest_os_features: Vec<String>,
    /// Storage location, e.g. `us` or `us-central1`
    pub storage_location: Option<String>,
    /// Limit for waiting on the insert operation (`None` waits forever)
    pub timeout: Option<Duration>,
}

impl Default for CreateImageOptions {
    fn default() -> Self {
        Self {
            source_project_id: None,
            guest_os_features: Vec::new(),
            storage_location: None,
            timeout: Some(DEFAULT_OPERATION_TIMEOUT),
        }
    }
}

/// Create an image in `project_id` based on a snapshot
pub async fn create_image_from_snapshot(
    compute: &dyn ComputeBackend,
    project_id: &str,
    source_snapshot_name: &str,
    image_name: &str,
    options: CreateImageOptions,
) -> ComputeResult<Image> {
    let source_project_id = options.source_project_id.as_deref().unwrap_or(project_id);

    let snapshot = compute
        .get_snapshot(source_project_id, source_snapshot_name)
        .await?;

    let mut request = ImageRequest::new(image_name, snapshot.self_link);
    if let Some(location) = options.storage_location {
        request = request.with_storage_location(location);
    }
    if !options.guest_os_features.is_empty() {
        request = request.with_guest_os_features(options.guest_os_features);
    }

    tracing::info!(
        project = %project_id,
        image = %image_name,
        source = %request.source_snapshot,
        "Creating image from snapshot"
    );

    let mut operation = compute.insert_image(project_id, request).await?;
    wait_for_extended_operation(
        operation.as_mut(),
        "image creation from snapshot",
        options.timeout,
    )
    .await?;

    compute.get_image(project_id, image_name).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ComputeError, WaitError};
    use crate::mock::InMemoryCompute;
    use crate::models::OperationWarning;

    #[tokio::test]
    async fn test_source_project_defaults_to_target() {
        let compute = InMemoryCompute::new();
        compute.add_snapshot("proj", "snap-1");

        let image =
            create_image_from_snapshot(&compute, "proj", "snap-1", "img-1", Default::default())
                .await
                .unwrap();

        assert_eq!(image.name, "img-1");
        assert!(image.source_snapshot.ends_with("/projects/proj/global/snapshots/snap-1"));
        assert!(image.storage_locations.is_empty());
        assert!(image.guest_os_features.is_empty());
    }

    #[tokio::test]
    async fn test_cross_project_with_location_and_features() {
        let compute = InMemoryCompute::new().with_polls_until_done(2);
        compute.add_snapshot("shared", "golden");

        let options = CreateImageOptions {
            source_project_id: Some("shared".to_string()),
            guest_os_features: vec!["UEFI_COMPATIBLE".to_string()],
            storage_location: Some("us-central1".to_string()),
            timeout: Some(Duration::from_secs(5)),
        };
        let image = create_image_from_snapshot(&compute, "proj", "golden", "img-2", options)
            .await
            .unwrap();

        assert!(image.source_snapshot.contains("/projects/shared/"));
        assert_eq!(image.storage_locations, vec!["us-central1"]);
        assert_eq!(image.guest_os_features[0].feature_type, "UEFI_COMPATIBLE");
        assert!(image.self_link.contains("/projects/proj/global/images/img-2"));
    }

    #[tokio::test]
    async fn test_missing_snapshot() {
        let compute = InMemoryCompute::new();
        let err = create_image_from_snapshot(&compute, "proj", "nope", "img", Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_insert_is_not_stored() {
        let compute = InMemoryCompute::new();
        compute.add_snapshot("proj", "snap");
        compute.fail_next_insert(400, "bad request");

        let err = create_image_from_snapshot(&compute, "proj", "snap", "img", Default::default())
            .await
            .unwrap_err();

        match err {
            ComputeError::Wait(WaitError::Runtime { code, message, .. }) => {
                assert_eq!(code, 400);
                assert_eq!(message, "bad request");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(compute.get_image("proj", "img").await.is_err());
    }

    #[tokio::test]
    async fn test_warnings_still_create_image() {
        let compute = InMemoryCompute::new();
        compute.add_snapshot("proj", "snap");
        compute.warn_next_insert(OperationWarning::new(
            "SINGLE_INSTANCE_PROPERTY_TEMPLATE",
            "property ignored",
        ));

        let image = create_image_from_snapshot(&compute, "proj", "snap", "img", Default::default())
            .await
            .unwrap();
        assert_eq!(image.name, "img");
    }
}
