use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::IoError;

/// Trait for acquiring the bytes of DICOM files by key.
///
/// This abstraction allows the render service to work with different storage
/// backends (local directories, S3) without being tied to a specific one.
/// Each call returns an owned buffer; implementations keep no per-request
/// state between calls.
#[async_trait]
pub trait DicomSource: Send + Sync {
    /// Read the complete contents of the file identified by `key`.
    async fn read(&self, key: &str) -> Result<Bytes, IoError>;

    /// List DICOM file keys (`*.dcm`), sorted, optionally restricted to a prefix.
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, IoError>;

    /// Human-readable location of `key`, for logging.
    fn identifier(&self, key: &str) -> String;
}

/// Whether a file name carries the `.dcm` extension (case-insensitive).
pub fn is_dicom_key(key: &str) -> bool {
    key.to_ascii_lowercase().ends_with(".dcm")
}

// =============================================================================
// LocalSource
// =============================================================================

/// Filesystem-backed implementation of `DicomSource`.
///
/// Keys are paths relative to `root` using `/` separators. Keys that are
/// absolute or contain `..` are rejected so requests cannot escape the root.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    /// Create a source serving files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto a path inside the root.
    pub fn resolve(&self, key: &str) -> Result<PathBuf, IoError> {
        if key.trim().is_empty() {
            return Err(IoError::InvalidPath("empty path".to_string()));
        }

        let relative = Path::new(key);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => return Err(IoError::InvalidPath(key.to_string())),
            }
        }

        Ok(self.root.join(relative))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        parts.map(|p| p.join("/"))
    }
}

fn map_fs_error(err: std::io::Error, what: &str) -> IoError {
    match err.kind() {
        std::io::ErrorKind::NotFound => IoError::NotFound(what.to_string()),
        _ => IoError::Read(format!("{}: {}", what, err)),
    }
}

#[async_trait]
impl DicomSource for LocalSource {
    async fn read(&self, key: &str) -> Result<Bytes, IoError> {
        let path = self.resolve(key)?;
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| map_fs_error(e, key))?;

        debug!(path = %path.display(), bytes = data.len(), "Read DICOM file");
        Ok(Bytes::from(data))
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<String>, IoError> {
        let root_name = self.root.display().to_string();
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        // Depth-first walk over the whole tree
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| map_fs_error(e, &root_name))?;

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| map_fs_error(e, &root_name))?
            {
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| map_fs_error(e, &root_name))?;
                let path = entry.path();

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    if let Some(key) = self.key_for(&path) {
                        if is_dicom_key(&key) {
                            files.push(key);
                        }
                    }
                }
            }
        }

        if let Some(prefix) = prefix {
            files.retain(|k| k.starts_with(prefix));
        }
        files.sort();

        Ok(files)
    }

    fn identifier(&self, key: &str) -> String {
        self.root.join(key).display().to_string()
    }
}
