//! Profile errors. Every variant is fatal to a conformance run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    /// The reference resolves to no manifest.
    #[error("profile {reference:?} not found (searched {searched:?})")]
    NotFound {
        reference: String,
        searched: Vec<PathBuf>,
    },

    /// YAML parsing failed, including unknown fields.
    #[error("failed to parse profile manifest at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The manifest declares a format version this loader does not read.
    #[error("unsupported manifest_version {version} in {path} (supported: {supported})")]
    UnsupportedVersion {
        path: PathBuf,
        version: u32,
        supported: u32,
    },

    /// The manifest parsed but a field value is unusable.
    #[error("invalid profile manifest at {path}: {detail}")]
    Invalid { path: PathBuf, detail: String },

    /// I/O error.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type ProfileResult<T> = Result<T, ProfileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_lists_candidates() {
        let err = ProfileError::NotFound {
            reference: "espr-core".to_string(),
            searched: vec![PathBuf::from("/tmp/espr-core"), PathBuf::from("/p/espr-core/profile.yaml")],
        };
        let msg = err.to_string();
        assert!(msg.contains("espr-core"));
        assert!(msg.contains("/p/espr-core/profile.yaml"));
    }
}
