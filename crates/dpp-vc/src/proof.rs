//! # Proof Objects
//!
//! The proof attached to a credential. Only `Ed25519Signature2020` is
//! verified; other declared types deserialize but fail verification with
//! [`VcError::UnsupportedProofType`](crate::VcError::UnsupportedProofType).

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    Ed25519Signature2020,
    #[serde(untagged)]
    Other(String),
}

impl ProofType {
    pub fn is_ed25519(&self) -> bool {
        matches!(self, ProofType::Ed25519Signature2020)
    }
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofType::Ed25519Signature2020 => write!(f, "Ed25519Signature2020"),
            ProofType::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    AssertionMethod,
    Authentication,
}

/// A proof on a credential. `proof_value` is the hex-encoded signature over
/// the canonical credential body without `proof`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: ProofType,

    /// Creation time, truncated to seconds.
    pub created: DateTime<Utc>,

    /// Identifier of the signing key, usually `<issuer>#<key-id>`.
    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    #[serde(rename = "proofPurpose")]
    pub proof_purpose: ProofPurpose,

    #[serde(rename = "proofValue")]
    pub proof_value: String,
}

impl Proof {
    /// An `Ed25519Signature2020` assertion proof created now.
    pub fn new_ed25519(verification_method: String, proof_value: String) -> Self {
        Self {
            proof_type: ProofType::Ed25519Signature2020,
            created: Utc::now().trunc_subsecs(0),
            verification_method,
            proof_purpose: ProofPurpose::AssertionMethod,
            proof_value,
        }
    }
}
