//! Upload directory

use std::path::{Path, PathBuf};

/// Directory that receives uploaded images.
///
/// Files are written under their (already sanitized) name and silently
/// replace an existing file with the same name.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `data` to `<dir>/<filename>`, creating the directory if needed
    pub async fn save(&self, filename: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, data).await?;

        tracing::info!(path = %path.display(), size = data.len(), "Upload saved");
        Ok(path)
    }
}
