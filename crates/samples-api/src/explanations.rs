//! Paths of the explanation images shown next to an analysis result

use crate::config::{ExplanationSettings, StorageSettings};

const ORIGINAL_IMAGE: &str = "original_img.png";
const PROTOTYPES_DIR: &str = "most_activated_prototypes";

/// Where the analyzer leaves its explanation images
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationLayout {
    read_dir: String,
    model_dir: String,
    top_k: usize,
}

/// The original image plus one activation map per rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationPaths {
    pub original: String,
    /// Activation maps ordered by rank, starting at rank 1
    pub activation_maps: Vec<String>,
}

impl ExplanationLayout {
    pub fn new(read_dir: impl Into<String>, model_dir: impl Into<String>, top_k: usize) -> Self {
        Self {
            read_dir: read_dir.into(),
            model_dir: model_dir.into(),
            top_k,
        }
    }

    pub fn from_settings(storage: &StorageSettings, explanations: &ExplanationSettings) -> Self {
        Self::new(
            storage.read_dir.clone(),
            explanations.model_dir.clone(),
            explanations.top_k,
        )
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Build the paths. Files are not checked for existence.
    pub fn paths(&self) -> ExplanationPaths {
        let base = join(&self.read_dir, &self.model_dir);
        let prototypes = join(&base, PROTOTYPES_DIR);

        ExplanationPaths {
            original: join(&base, ORIGINAL_IMAGE),
            activation_maps: (1..=self.top_k)
                .map(|rank| {
                    join(
                        &prototypes,
                        &format!("prototype_activation_map_by_top-{}_prototype.png", rank),
                    )
                })
                .collect(),
        }
    }
}

/// Join URL-style path segments with a single `/`
fn join(base: &str, segment: &str) -> String {
    let base = base.trim_end_matches('/');
    let segment = segment.trim_start_matches('/');
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    }
}
