use crate::foundation::error::{SpectroError, SpectroResult};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Finished recording: concatenated container bytes tagged with their mime type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn from_chunks(mime_type: impl Into<String>, chunks: &[Vec<u8>]) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: chunks.concat(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where finished exports are handed to the user.
pub trait DownloadTarget {
    /// Store `blob` under `file_name`; returns where it ended up.
    fn deliver(&mut self, file_name: &str, blob: &Blob) -> SpectroResult<PathBuf>;
}

/// Writes exports into a directory, creating it on first use.
#[derive(Clone, Debug)]
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DownloadTarget for DirectoryDownloads {
    fn deliver(&mut self, file_name: &str, blob: &Blob) -> SpectroResult<PathBuf> {
        use anyhow::Context as _;

        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(SpectroError::validation(format!(
                "download file name '{file_name}' must be a bare file name"
            )));
        }
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create download directory '{}'", self.dir.display())
        })?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, &blob.bytes)
            .with_context(|| format!("failed to write export '{}'", path.display()))?;
        tracing::info!(
            path = %path.display(),
            bytes = blob.len(),
            mime = %blob.mime_type,
            "export written"
        );
        Ok(path)
    }
}

/// `spectroflow-export-<unix-millis>.<ext>`
pub fn export_file_name(unix_millis: u128, extension: &str) -> String {
    format!("spectroflow-export-{unix_millis}.{extension}")
}

pub fn unix_millis_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/download.rs"]
mod tests;
