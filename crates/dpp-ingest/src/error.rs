//! Ingestion errors.
//!
//! Every variant is fatal when it concerns the initial target of a run.
//! Failures on secondary content (archive entries, persistence) are turned
//! into findings by the orchestrator instead.

use std::path::PathBuf;

use dpp_core::{ArtifactKind, InputKind};
use thiserror::Error;

/// Errors from fetching, reading, or expanding content.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Local file does not exist.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// Local file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The classified input kind has no ingestion adapter.
    #[error("cannot ingest {kind} target {target:?}")]
    UnsupportedInput { kind: InputKind, target: String },

    /// The reference cannot be turned into a URL.
    #[error("invalid reference {reference:?}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The URL scheme is not fetchable.
    #[error("unsupported URL scheme {scheme:?} in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("timed out after {timeout_secs}s fetching {url}")]
    Timeout { url: String, timeout_secs: u64 },

    /// Transport failure (DNS, connect, TLS, body read).
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        source: reqwest::Error,
    },

    /// The response body exceeded the configured limit.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    /// The HTTP client could not be constructed.
    #[error("HTTP client initialization failed: {0}")]
    Client(String),

    /// An artifact of the wrong kind was handed to an adapter.
    #[error("expected a {expected} artifact, got {actual} ({uri})")]
    KindMismatch {
        uri: String,
        expected: ArtifactKind,
        actual: ArtifactKind,
    },

    /// The package container itself is unreadable.
    #[error("unreadable package {uri}: {reason}")]
    Archive { uri: String, reason: String },
}

/// Persistence failure in the content-addressed store.
#[derive(Debug, Error)]
#[error("failed to persist artifact to {path}: {source}")]
pub struct StoreError {
    pub path: PathBuf,
    pub source: std::io::Error,
}
