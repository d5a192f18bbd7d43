//! Application state for the annotate API

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analyzer::{CommandAnalyzer, ImageAnalyzer, NullAnalyzer};
use crate::config::AppConfig;
use crate::explanations::ExplanationLayout;
use crate::storage::UploadStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<dyn ImageAnalyzer>,
    store: Arc<UploadStore>,
    explanations: Arc<ExplanationLayout>,
    /// Directory served under `/static`
    static_dir: Arc<PathBuf>,
    max_upload_bytes: usize,
}

impl AppState {
    /// Create a new AppState from configuration and an analyzer
    pub fn new(config: &AppConfig, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        Self {
            analyzer,
            store: Arc::new(UploadStore::new(config.storage.upload_dir.clone())),
            explanations: Arc::new(ExplanationLayout::from_settings(
                &config.storage,
                &config.explanations,
            )),
            static_dir: Arc::new(config.storage.static_dir.clone()),
            max_upload_bytes: config.server.max_upload_bytes,
        }
    }

    /// Create AppState with the analyzer described by the configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let analyzer: Arc<dyn ImageAnalyzer> = match &config.analyzer {
            Some(settings) => Arc::new(CommandAnalyzer::from(settings)),
            None => Arc::new(NullAnalyzer),
        };
        Self::new(config, analyzer)
    }

    pub fn analyzer(&self) -> &dyn ImageAnalyzer {
        self.analyzer.as_ref()
    }

    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    pub fn explanations(&self) -> &ExplanationLayout {
        &self.explanations
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}
