//! samples-api - Upload-and-annotate web endpoint
//!
//! Serves a single page where a user uploads an image. The image is stored
//! under a sanitized name, handed to an [`ImageAnalyzer`], and the result is
//! rendered together with the explanation images the analysis produces.
//!
//! # Usage
//!
//! ```ignore
//! use samples_api::{create_router, AppConfig, AppState};
//!
//! let config = AppConfig::load("samplesd.toml")?;
//! let state = AppState::from_config(&config);
//! let router = create_router(state);
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod explanations;
pub mod handlers;
pub mod render;
pub mod sanitize;
pub mod state;
pub mod storage;

pub use analyzer::{AnalyzerError, CommandAnalyzer, ImageAnalyzer, NullAnalyzer};
pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use explanations::{ExplanationLayout, ExplanationPaths};
pub use sanitize::secure_filename;
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the annotate router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(state.static_dir());
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes());

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Upload form and analysis
        .route(
            "/",
            get(handlers::analyze::show_form).post(handlers::analyze::upload_and_analyze),
        )
        // Uploaded images and explanation images
        .nest_service("/static", static_files)
        .fallback(handlers::not_found)
        // Middleware
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
