//! Compute image and snapshot models

use serde::{Deserialize, Serialize};

const COMPUTE_BASE_URL: &str = "https://www.googleapis.com/compute/v1";

/// A disk snapshot that can seed a new image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    /// Project hosting the snapshot
    pub project: String,
    /// Fully qualified resource link
    pub self_link: String,
}

impl Snapshot {
    pub fn new(project: impl Into<String>, name: impl Into<String>) -> Self {
        let project = project.into();
        let name = name.into();
        let self_link = format!(
            "{}/projects/{}/global/snapshots/{}",
            COMPUTE_BASE_URL, project, name
        );
        Self {
            name,
            project,
            self_link,
        }
    }
}

/// A guest OS feature enabled on a bootable image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestOsFeature {
    /// Feature type, e.g. `UEFI_COMPATIBLE`
    #[serde(rename = "type")]
    pub feature_type: String,
}

/// Request body for inserting an image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub name: String,
    /// Self link of the snapshot the image is built from
    pub source_snapshot: String,
    /// Storage locations; empty lets the provider choose
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub storage_locations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub guest_os_features: Vec<GuestOsFeature>,
}

impl ImageRequest {
    pub fn new(name: impl Into<String>, source_snapshot: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_snapshot: source_snapshot.into(),
            ..Default::default()
        }
    }

    pub fn with_storage_location(mut self, location: impl Into<String>) -> Self {
        self.storage_locations = vec![location.into()];
        self
    }

    pub fn with_guest_os_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guest_os_features = features
            .into_iter()
            .map(|f| GuestOsFeature {
                feature_type: f.into(),
            })
            .collect();
        self
    }
}

/// A stored compute image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub source_snapshot: String,
    #[serde(default)]
    pub storage_locations: Vec<String>,
    #[serde(default)]
    pub guest_os_features: Vec<GuestOsFeature>,
    pub self_link: String,
}

impl Image {
    /// Materialize an image from an insert request
    pub fn from_request(project: &str, request: ImageRequest) -> Self {
        let self_link = format!(
            "{}/projects/{}/global/images/{}",
            COMPUTE_BASE_URL, project, request.name
        );
        Self {
            name: request.name,
            source_snapshot: request.source_snapshot,
            storage_locations: request.storage_locations,
            guest_os_features: request.guest_os_features,
            self_link,
        }
    }
}
