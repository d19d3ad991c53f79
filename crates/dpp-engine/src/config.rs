//! Engine configuration.
//!
//! Defaults suit a checkout with bundled profiles under `./profiles`.
//! Environment variables override them; CLI flags override both.

use std::path::PathBuf;

use dpp_ingest::config::env_parse;
use dpp_ingest::{ArchiveExpander, ConfigError, FetchConfig};

/// Settings for [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Root directory of bundled profiles (`<profiles_dir>/<ref>/profile.yaml`).
    pub profiles_dir: PathBuf,
    /// Network adapter settings.
    pub fetch: FetchConfig,
    /// Largest archive entry extracted from a package.
    pub max_archive_entry_bytes: u64,
    /// How many levels of nested packages are expanded.
    pub max_archive_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let archive = ArchiveExpander::default();
        Self {
            profiles_dir: PathBuf::from("profiles"),
            fetch: FetchConfig::default(),
            max_archive_entry_bytes: archive.max_entry_bytes,
            max_archive_depth: archive.max_depth,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DPP_PROFILES_DIR` (default: `profiles`)
    /// - `DPP_MAX_ARCHIVE_ENTRY_BYTES` (default: 64 MiB)
    /// - `DPP_MAX_ARCHIVE_DEPTH` (default: 2)
    /// - the `DPP_FETCH_*` variables read by [`FetchConfig::from_env()`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            profiles_dir: std::env::var_os("DPP_PROFILES_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.profiles_dir),
            fetch: FetchConfig::from_env()?,
            max_archive_entry_bytes: env_parse(
                "DPP_MAX_ARCHIVE_ENTRY_BYTES",
                defaults.max_archive_entry_bytes,
            )?,
            max_archive_depth: env_parse("DPP_MAX_ARCHIVE_DEPTH", defaults.max_archive_depth)?,
        })
    }

    pub fn with_profiles_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profiles_dir = dir.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch.timeout_secs = secs;
        self
    }

    pub(crate) fn archive_expander(&self) -> ArchiveExpander {
        ArchiveExpander {
            max_entry_bytes: self.max_archive_entry_bytes,
            max_depth: self.max_archive_depth,
        }
    }
}
