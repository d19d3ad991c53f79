//! # Profile Loader
//!
//! `load(reference)` tries, in order:
//!
//! 1. `reference` as a manifest file path
//! 2. `reference` as a directory containing `profile.yaml`
//! 3. `<profiles_dir>/<reference>/profile.yaml`
//!
//! The loaded profile has its companion paths resolved against the
//! manifest's directory.

use std::path::{Path, PathBuf};

use crate::error::{ProfileError, ProfileResult};
use crate::manifest::Profile;

/// File name of a manifest inside a profile directory.
pub const MANIFEST_FILE_NAME: &str = "profile.yaml";

/// Resolves profile references to manifests.
#[derive(Debug, Clone)]
pub struct ProfileLoader {
    profiles_dir: PathBuf,
}

impl ProfileLoader {
    /// A loader whose bundled profiles live under `profiles_dir`.
    pub fn new(profiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
        }
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    /// Find the manifest file for a reference.
    pub fn locate(&self, reference: &str) -> ProfileResult<PathBuf> {
        let direct = PathBuf::from(reference);
        let candidates = [
            direct.clone(),
            direct.join(MANIFEST_FILE_NAME),
            self.profiles_dir.join(reference).join(MANIFEST_FILE_NAME),
        ];
        candidates
            .iter()
            .find(|c| c.is_file())
            .cloned()
            .ok_or_else(|| ProfileError::NotFound {
                reference: reference.to_string(),
                searched: candidates.to_vec(),
            })
    }

    /// Locate, parse, validate and path-resolve a profile.
    pub fn load(&self, reference: &str) -> ProfileResult<Profile> {
        let path = self.locate(reference)?;
        let profile = load_manifest(&path)?;
        tracing::info!(
            profile = %profile.id,
            version = %profile.version,
            path = %path.display(),
            companions = profile.artifacts.len(),
            "loaded profile"
        );
        Ok(profile)
    }
}

/// Read one manifest file and resolve its companion paths.
pub fn load_manifest(path: &Path) -> ProfileResult<Profile> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProfileError::NotFound {
                reference: path.display().to_string(),
                searched: vec![path.to_path_buf()],
            }
        } else {
            ProfileError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let profile = Profile::from_yaml_str(&text, path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(profile.resolve_paths(base_dir))
}
