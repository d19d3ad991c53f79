//! # Error Types
//!
//! Errors raised by the foundational types. Higher layers wrap these in
//! their own `thiserror` enums; nothing here is fatal on its own.

use thiserror::Error;

/// Errors from core value construction and serialization.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A digest string was not 64 hex characters.
    #[error("invalid SHA-256 digest: {0:?} (expected 64 hex chars)")]
    InvalidDigest(String),

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A severity label was not one of info, warning, error, critical.
    #[error("unknown severity {0:?}")]
    UnknownSeverity(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raised when no supported text encoding decodes a byte sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unable to decode {len} bytes as UTF-8 or UTF-16 text")]
pub struct DecodeError {
    /// Length of the rejected input.
    pub len: usize,
}
