//! Fatal run errors.
//!
//! These are the only errors a conformance run returns. Anything that
//! happens after the initial artifact is in hand becomes a finding.

use dpp_core::InputKind;
use dpp_ingest::{ConfigError, IngestError};
use dpp_profile::ProfileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatalError {
    /// The profile reference does not resolve to a valid manifest.
    #[error("profile error: {0}")]
    Profile(#[from] ProfileError),

    /// The initial target could not be read or fetched.
    #[error("ingestion failed: {0}")]
    Ingest(IngestError),

    /// The target classified fine but no adapter can produce content for it.
    #[error("cannot resolve {kind} target {target:?}")]
    Unresolvable { kind: InputKind, target: String },

    /// Engine configuration from the environment is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<IngestError> for FatalError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnsupportedInput { kind, target } => Self::Unresolvable { kind, target },
            other => Self::Ingest(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_input_becomes_unresolvable() {
        let err: FatalError = IngestError::UnsupportedInput {
            kind: InputKind::Did,
            target: "did:web:example.org".into(),
        }
        .into();
        assert!(matches!(err, FatalError::Unresolvable { kind: InputKind::Did, .. }));
        assert!(err.to_string().contains("did:web:example.org"));
    }

    #[test]
    fn other_ingest_errors_stay_ingest() {
        let err: FatalError = IngestError::HttpStatus {
            url: "https://example.org/p".into(),
            status: 404,
        }
        .into();
        assert!(matches!(err, FatalError::Ingest(IngestError::HttpStatus { status: 404, .. })));
    }
}
