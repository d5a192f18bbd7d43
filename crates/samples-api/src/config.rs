//! TOML configuration for the annotate server
//!
//! Every section is optional; missing sections and keys fall back to the
//! layout the sample was originally deployed with (`static/Image`, the
//! `vgg19` prototype folder, ten activation maps).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level server configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub explanations: ExplanationSettings,
    /// External analysis program; absent means no analyzer is configured
    #[serde(default)]
    pub analyzer: Option<AnalyzerSettings>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Where uploads are written and explanation images are read from
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_image_dir")]
    pub upload_dir: PathBuf,
    /// Folder the rendered explanation paths are rooted at
    #[serde(default = "default_image_dir_str")]
    pub read_dir: String,
}

/// Layout of the explanation images produced by the analyzer
#[derive(Debug, Clone, Deserialize)]
pub struct ExplanationSettings {
    /// Model output folder, relative to `read_dir`
    #[serde(default = "default_model_dir")]
    pub model_dir: String,
    /// Number of activation maps to render
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerSettings {
    pub program: String,
    /// Arguments placed before the directory and filename
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("static/Image")
}

fn default_image_dir_str() -> String {
    "static/Image".to_string()
}

fn default_model_dir() -> String {
    "vgg19/001/100_1push0.7413.pth".to_string()
}

fn default_top_k() -> usize {
    10
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            static_dir: default_static_dir(),
            upload_dir: default_image_dir(),
            read_dir: default_image_dir_str(),
        }
    }
}

impl Default for ExplanationSettings {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            top_k: default_top_k(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.explanations.top_k == 0 {
            return Err(ConfigError::Invalid(
                "explanations.top_k must be at least 1".to_string(),
            ));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_upload_bytes must be positive".to_string(),
            ));
        }
        if let Some(analyzer) = &self.analyzer {
            if analyzer.program.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "analyzer.program must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
