//! # Content-Addressed Artifact Store
//!
//! Artifacts are persisted as `<sha256-hex>.<ext>` under one directory.
//! The extension follows the content type: `json`, `xml`, `ttl`, else `bin`.
//!
//! ## Idempotence
//!
//! Bytes are written to a temporary file in the store directory and then
//! linked into place without overwriting, so a failed write never leaves a
//! partial `<sha256-hex>.<ext>` behind. `AlreadyExists` is success once the
//! existing file is confirmed to hold the artifact's bytes; a file that does
//! not is replaced. Concurrent writers of the same artifact race harmlessly.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dpp_core::Artifact;
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// A directory of content-addressed artifact files.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    base_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Where `artifact` lives (or would live) in this store.
    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.base_dir.join(format!(
            "{}.{}",
            artifact.sha256(),
            extension_for(artifact.content_type())
        ))
    }

    /// Write `artifact` unless a file with its digest already exists.
    pub fn persist(&self, artifact: &Artifact) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.base_dir).map_err(|source| StoreError {
            path: self.base_dir.clone(),
            source,
        })?;

        let path = self.path_for(artifact);
        if holds(&path, artifact) {
            tracing::trace!(path = %path.display(), "artifact already stored");
            return Ok(path);
        }

        let io_err = |source| StoreError {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.base_dir).map_err(io_err)?;
        tmp.write_all(artifact.bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => tracing::debug!(path = %path.display(), "persisted artifact"),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                if holds(&path, artifact) {
                    tracing::trace!(path = %path.display(), "artifact already stored");
                } else {
                    tracing::warn!(path = %path.display(), "replacing artifact file with mismatched content");
                    e.file.persist(&path).map_err(|e| StoreError {
                        path: path.clone(),
                        source: e.error,
                    })?;
                }
            }
            Err(e) => return Err(StoreError { path, source: e.error }),
        }
        Ok(path)
    }
}

fn holds(path: &Path, artifact: &Artifact) -> bool {
    fs::read(path).is_ok_and(|stored| stored == artifact.bytes())
}

/// File extension for a content type.
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let ct = content_type.unwrap_or_default().to_ascii_lowercase();
    if ct.contains("json") {
        "json"
    } else if ct.contains("xml") {
        "xml"
    } else if ct.contains("turtle") {
        "ttl"
    } else {
        "bin"
    }
}
