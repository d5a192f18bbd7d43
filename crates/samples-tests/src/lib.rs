//! Integration tests for the samples server
//!
//! This crate contains end-to-end tests that exercise the full stack:
//! - HTTP upload endpoint over a real socket
//! - Upload storage on disk
//! - Image creation against the in-memory compute backend
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p samples-tests
//! ```
//!
//! # Test Structure
//!
//! - `upload_e2e_test.rs` - Upload, analyze and render over HTTP
//! - `image_workflow_test.rs` - Snapshot to image workflow and operation waits

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use samples_api::{create_router, AnalyzerError, AppConfig, AppState, ImageAnalyzer};
use tokio::net::TcpListener;

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve `router` on an ephemeral local port
    pub async fn start(router: axum::Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            client: reqwest::Client::new(),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Analyzer that records every call and answers with a fixed text
#[derive(Clone, Default)]
pub struct RecordingAnalyzer {
    calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    fail: bool,
}

impl RecordingAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer whose every call fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// `(dir, filename)` of every call so far
    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageAnalyzer for RecordingAnalyzer {
    async fn analyze(&self, dir: &Path, filename: &str) -> Result<String, AnalyzerError> {
        self.calls
            .lock()
            .push((dir.to_path_buf(), filename.to_string()));
        if self.fail {
            return Err(AnalyzerError::Other("prototype network unavailable".to_string()));
        }
        Ok(format!("Predicted class for {}: 17 (Cardinal)", filename))
    }
}

/// Server rooted in a temporary directory
pub struct UploadFixture {
    pub server: TestServer,
    pub analyzer: RecordingAnalyzer,
    pub config: AppConfig,
    // Held so the directory outlives the server
    _root: tempfile::TempDir,
}

impl UploadFixture {
    pub async fn start(analyzer: RecordingAnalyzer) -> std::io::Result<Self> {
        Self::start_with(analyzer, |_| {}).await
    }

    /// Start with a configuration tweak applied on top of the defaults
    pub async fn start_with(
        analyzer: RecordingAnalyzer,
        configure: impl FnOnce(&mut AppConfig),
    ) -> std::io::Result<Self> {
        let root = tempfile::tempdir()?;
        let mut config = AppConfig::default();
        config.storage.static_dir = root.path().join("static");
        config.storage.upload_dir = root.path().join("static/Image");
        configure(&mut config);

        let state = AppState::new(&config, Arc::new(analyzer.clone()));
        let server = TestServer::start(create_router(state)).await?;

        Ok(Self {
            server,
            analyzer,
            config,
            _root: root,
        })
    }

    /// Location of a stored upload
    pub fn upload_path(&self, filename: &str) -> PathBuf {
        self.config.storage.upload_dir.join(filename)
    }
}
