//! # Profile Manifest
//!
//! The manifest is a strict, versioned document. Every struct denies unknown
//! fields, so a misspelled key fails the load instead of silently dropping a
//! companion:
//!
//! ```yaml
//! manifest_version: 1          # optional, only 1 is accepted
//! id: espr-core
//! version: "0.1.0"
//! description: Core product passport checks
//! entrypoint_media_types: [application/ld+json, application/json]
//! artifacts:
//!   schemas: [schemas/passport.schema.json]
//!   shapes: [shapes/passport.ttl]
//!   openapi: []
//!   rules: [rules/passport.yaml]
//!   contexts: [contexts/dpp.jsonld]
//! trust:
//!   allowed_issuers: [did:web:issuer.example]
//!   vc_formats: [ldp_vc]
//! ```
//!
//! Companion paths are relative to the manifest's directory until
//! [`Profile::resolve_paths`] makes them absolute.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, ProfileResult};

/// The only manifest format version this crate reads.
pub const MANIFEST_VERSION: u32 = 1;

fn default_manifest_version() -> u32 {
    MANIFEST_VERSION
}

/// A named, versioned bundle of companion artifacts and trust constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    #[serde(default = "default_manifest_version")]
    pub manifest_version: u32,
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media types the profile expects its entry artifact in, in preference order.
    #[serde(default)]
    pub entrypoint_media_types: Vec<String>,
    #[serde(default)]
    pub artifacts: CompanionPaths,
    #[serde(default)]
    pub trust: TrustPolicy,
}

/// Companion artifact paths, one ordered list per companion kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanionPaths {
    #[serde(default)]
    pub schemas: Vec<PathBuf>,
    #[serde(default)]
    pub shapes: Vec<PathBuf>,
    #[serde(default)]
    pub openapi: Vec<PathBuf>,
    #[serde(default)]
    pub rules: Vec<PathBuf>,
    #[serde(default)]
    pub contexts: Vec<PathBuf>,
}

impl CompanionPaths {
    pub fn len(&self) -> usize {
        self.schemas.len() + self.shapes.len() + self.openapi.len() + self.rules.len() + self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn paths_mut(&mut self) -> impl Iterator<Item = &mut PathBuf> {
        self.schemas
            .iter_mut()
            .chain(self.shapes.iter_mut())
            .chain(self.openapi.iter_mut())
            .chain(self.rules.iter_mut())
            .chain(self.contexts.iter_mut())
    }
}

/// Constraints on credentials found among the artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustPolicy {
    /// Issuer identifiers accepted for credentials. Empty accepts any.
    #[serde(default)]
    pub allowed_issuers: Vec<String>,
    /// Credential formats accepted, e.g. `ldp_vc`. Empty accepts any.
    #[serde(default)]
    pub vc_formats: Vec<String>,
}

impl TrustPolicy {
    pub fn allows_issuer(&self, issuer: &str) -> bool {
        self.allowed_issuers.is_empty() || self.allowed_issuers.iter().any(|i| i == issuer)
    }

    pub fn allows_format(&self, format: &str) -> bool {
        self.vc_formats.is_empty() || self.vc_formats.iter().any(|f| f == format)
    }
}

impl Profile {
    /// Parse and validate manifest text. `path` labels errors.
    pub fn from_yaml_str(text: &str, path: &Path) -> ProfileResult<Self> {
        let profile: Profile = serde_yaml::from_str(text).map_err(|e| ProfileError::YamlParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        profile.validate(path)?;
        Ok(profile)
    }

    fn validate(&self, path: &Path) -> ProfileResult<()> {
        if self.manifest_version != MANIFEST_VERSION {
            return Err(ProfileError::UnsupportedVersion {
                path: path.to_path_buf(),
                version: self.manifest_version,
                supported: MANIFEST_VERSION,
            });
        }
        for (field, value) in [("id", &self.id), ("version", &self.version)] {
            if value.trim().is_empty() {
                return Err(ProfileError::Invalid {
                    path: path.to_path_buf(),
                    detail: format!("{field} must not be empty"),
                });
            }
        }
        Ok(())
    }

    /// Rewrite every companion path to an absolute path.
    ///
    /// Relative paths are joined to `base_dir`. Paths are canonicalized when
    /// they exist and lexically normalized otherwise, so resolving an
    /// already-resolved profile returns it unchanged.
    pub fn resolve_paths(&self, base_dir: &Path) -> Profile {
        let base_dir = absolutize(base_dir);
        let mut resolved = self.clone();
        for path in resolved.artifacts.paths_mut() {
            let joined = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(&*path)
            };
            *path = std::fs::canonicalize(&joined).unwrap_or_else(|_| normalize_lexically(&joined));
        }
        resolved
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

/// Drop `.` components and fold `..` into its parent without touching the
/// filesystem.
pub(crate) fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
