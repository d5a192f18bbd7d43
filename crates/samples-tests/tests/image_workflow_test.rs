//! Snapshot to image workflow against the in-memory compute backend
//!
//! Run with: cargo test -p samples-tests --test image_workflow_test

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use samples_core::{
    create_image_from_snapshot, wait_for_extended_operation, ComputeBackend, ComputeError,
    CreateImageOptions, ImageRequest, InMemoryCompute, Operation, OperationSource,
    OperationWarning, PollingOperation, WaitError,
};

#[tokio::test]
async fn test_image_created_from_snapshot_in_other_project() {
    let compute = InMemoryCompute::new().with_polls_until_done(3);
    let snapshot = compute.add_snapshot("golden-images", "debian-12-base");

    let options = CreateImageOptions {
        source_project_id: Some("golden-images".to_string()),
        guest_os_features: vec!["UEFI_COMPATIBLE".to_string(), "GVNIC".to_string()],
        storage_location: Some("eu".to_string()),
        ..Default::default()
    };
    let image =
        create_image_from_snapshot(&compute, "workloads", "debian-12-base", "debian-12", options)
            .await
            .unwrap();

    assert_eq!(image.source_snapshot, snapshot.self_link);
    assert_eq!(image.storage_locations, vec!["eu".to_string()]);
    let features: Vec<_> = image
        .guest_os_features
        .iter()
        .map(|f| f.feature_type.as_str())
        .collect();
    assert_eq!(features, vec!["UEFI_COMPATIBLE", "GVNIC"]);

    let stored = compute.get_image("workloads", "debian-12").await.unwrap();
    assert_eq!(stored, image);
}

#[tokio::test]
async fn test_missing_snapshot_is_not_found() {
    let compute = InMemoryCompute::new();

    let err = create_image_from_snapshot(&compute, "p", "nope", "img", Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ComputeError::NotFound(_)));
    assert!(err.to_string().contains("nope"));
}

#[tokio::test]
async fn test_operation_error_surfaces_as_runtime_failure() {
    let compute = InMemoryCompute::new().with_polls_until_done(1);
    compute.add_snapshot("p", "snap");
    compute.fail_next_insert(403, "QUOTA_EXCEEDED");

    let err = create_image_from_snapshot(&compute, "p", "snap", "img", Default::default())
        .await
        .unwrap_err();

    match err {
        ComputeError::Wait(WaitError::Runtime {
            operation,
            code,
            message,
        }) => {
            assert_eq!(operation, "image creation from snapshot");
            assert_eq!(code, 403);
            assert_eq!(message, "QUOTA_EXCEEDED");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_warnings_do_not_fail_the_workflow() {
    let compute = InMemoryCompute::new();
    compute.add_snapshot("p", "snap");
    compute.warn_next_insert(OperationWarning::new(
        "DEPRECATED_RESOURCE_USED",
        "The source snapshot uses a deprecated format",
    ));

    let image = create_image_from_snapshot(&compute, "p", "snap", "img", Default::default())
        .await
        .unwrap();
    assert_eq!(image.name, "img");
}

#[tokio::test]
async fn test_slow_operation_times_out() {
    let compute = InMemoryCompute::new().with_polls_until_done(1_000);
    compute.add_snapshot("p", "snap");

    let options = CreateImageOptions {
        timeout: Some(Duration::from_millis(30)),
        ..Default::default()
    };
    let err = create_image_from_snapshot(&compute, "p", "snap", "img", options)
        .await
        .unwrap_err();

    match err {
        ComputeError::Wait(wait) => assert!(wait.is_timeout()),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(compute.get_image("p", "img").await.is_err());
}

#[tokio::test]
async fn test_waiter_on_insert_operation_directly() {
    let compute = InMemoryCompute::new().with_polls_until_done(2);
    let snapshot = compute.add_snapshot("p", "snap");

    let mut operation = compute
        .insert_image("p", ImageRequest::new("direct", snapshot.self_link))
        .await
        .unwrap();

    let link = wait_for_extended_operation(operation.as_mut(), "direct insert", None)
        .await
        .unwrap();
    assert!(link.ends_with("/projects/p/global/images/direct"));
}

struct FixedSource;

#[async_trait::async_trait]
impl OperationSource<u32> for FixedSource {
    async fn get_operation(
        &self,
        name: &str,
    ) -> Result<Operation<u32>, samples_core::BoxError> {
        Ok(Operation::done(name, 42))
    }
}

#[tokio::test]
async fn test_polling_operation_over_custom_source() {
    let mut operation = PollingOperation::new(Arc::new(FixedSource), Operation::pending("op-42"))
        .with_poll_interval(Duration::from_millis(1));

    let value = wait_for_extended_operation(&mut operation, "counting", Some(Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert!(operation.current().is_done());
}
