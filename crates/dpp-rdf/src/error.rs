//! Normalization errors.
//!
//! None of these abort a run. The orchestrator turns each into a finding
//! tagged with the stage that asked for the normalization.

use dpp_core::{ArtifactKind, DecodeError};
use thiserror::Error;

use crate::graph::RdfSyntax;

#[derive(Debug, Error)]
pub enum RdfError {
    /// The operation does not apply to this artifact kind.
    #[error("{operation} is not defined for {kind} artifact {uri}")]
    TypeMismatch {
        uri: String,
        kind: ArtifactKind,
        operation: &'static str,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid JSON in {uri}: {source}")]
    Json {
        uri: String,
        source: serde_json::Error,
    },

    /// The content is not valid for its declared RDF syntax.
    #[error("failed to parse {uri} as {syntax}: {reason}")]
    Parse {
        uri: String,
        syntax: RdfSyntax,
        reason: String,
    },

    /// A remote `@context` reference has no local counterpart.
    #[error("unresolved JSON-LD context {context:?} in {uri}")]
    UnresolvedContext { uri: String, context: String },

    #[error("RDF serialization failed: {0}")]
    Serialize(String),

    /// The document is JSON but not a well-formed AAS environment.
    #[error("invalid AAS environment in {uri}: {reason}")]
    Aas { uri: String, reason: String },

    /// The shapes graph uses a constraint incorrectly.
    #[error("invalid shapes graph: {0}")]
    Shapes(String),
}
