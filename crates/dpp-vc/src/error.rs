//! Credential, key and attestation errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcError {
    /// Canonicalization of the credential body or report failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] dpp_core::CoreError),

    /// Ed25519 signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// The proof has an unsupported type for verification.
    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(String),

    /// The credential has no proofs to verify.
    #[error("credential has no proofs")]
    NoProofs,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The proof value has invalid hex encoding or wrong length.
    #[error("invalid proof value: {0}")]
    InvalidProofValue(String),

    /// A key could not be parsed or resolved.
    #[error("key error: {0}")]
    Key(String),

    /// The credential bytes are not a JSON credential.
    #[error("unsupported credential format: {0}")]
    UnsupportedFormat(String),

    /// Attestations are only issued for finalized reports.
    #[error("report for {target} is not finalized")]
    NotFinalized { target: String },

    /// The attested report hash does not match the supplied report.
    #[error("report hash mismatch: credential attests {attested}, report hashes to {actual}")]
    ReportHashMismatch { attested: String, actual: String },

    /// The credential is not a conformance attestation.
    #[error("invalid attestation: {0}")]
    InvalidAttestation(String),
}
