//! Image analysis collaborators
//!
//! The endpoint hands every stored upload to an [`ImageAnalyzer`] and shows
//! whatever text it returns. The analysis itself lives outside this crate;
//! [`CommandAnalyzer`] runs it as an external program.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::AnalyzerSettings;

/// Errors from running an analysis
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The analysis program could not be started
    #[error("Failed to start analyzer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The analysis program exited unsuccessfully
    #[error("Analyzer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// Any other analysis failure
    #[error("Analysis failed: {0}")]
    Other(String),
}

/// Runs the analysis for one stored upload
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Analyze `dir/filename` and return a free-form result text
    async fn analyze(&self, dir: &Path, filename: &str) -> Result<String, AnalyzerError>;
}

/// Runs `program [args..] <dir> <filename>` and returns its standard output
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl From<&AnalyzerSettings> for CommandAnalyzer {
    fn from(settings: &AnalyzerSettings) -> Self {
        Self::new(settings.program.clone()).with_args(settings.args.iter().cloned())
    }
}

#[async_trait]
impl ImageAnalyzer for CommandAnalyzer {
    async fn analyze(&self, dir: &Path, filename: &str) -> Result<String, AnalyzerError> {
        tracing::debug!(
            program = %self.program,
            dir = %dir.display(),
            filename,
            "Running analyzer"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(dir)
            .arg(filename)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| AnalyzerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(AnalyzerError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Analyzer used when nothing is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAnalyzer;

#[async_trait]
impl ImageAnalyzer for NullAnalyzer {
    async fn analyze(&self, _dir: &Path, filename: &str) -> Result<String, AnalyzerError> {
        Ok(format!(
            "Saved {}. No analyzer is configured for this server.",
            filename
        ))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_receives_dir_and_filename() {
        let analyzer = CommandAnalyzer::new("sh").with_args(["-c", "echo \"$0|$1\""]);
        let out = analyzer
            .analyze(Path::new("static/Image"), "bird.png")
            .await
            .unwrap();
        assert_eq!(out, "static/Image|bird.png");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_error() {
        let analyzer = CommandAnalyzer::new("sh").with_args(["-c", "echo broken >&2; exit 3"]);
        let err = analyzer
            .analyze(Path::new("."), "x.png")
            .await
            .unwrap_err();
        match err {
            AnalyzerError::Failed { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let analyzer = CommandAnalyzer::new("definitely-not-an-analyzer-binary");
        let err = analyzer
            .analyze(Path::new("."), "x.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_null_analyzer_mentions_file() {
        let out = NullAnalyzer.analyze(Path::new("."), "x.png").await.unwrap();
        assert!(out.contains("x.png"));
    }
}
