//! # Verifiable Credential
//!
//! A W3C-style credential envelope with embedded proofs.
//!
//! ## Invariants
//!
//! - **Signing** canonicalizes the credential with `proof` removed through
//!   [`CanonicalBytes::new()`], signs those bytes, and appends a [`Proof`].
//! - **Verification** recomputes the same canonical bytes and checks every
//!   proof. A credential without proofs never verifies.
//! - Members the envelope does not model are kept in `extra` so that they
//!   stay covered by the signature after a parse and re-serialize.

use chrono::{DateTime, Utc};
use dpp_core::{decode_text, CanonicalBytes};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ed25519::{verify, Ed25519KeyPair, Ed25519Signature};
use crate::error::VcError;
use crate::proof::Proof;
use crate::resolver::KeyResolver;

pub const VC_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// How a credential token is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFormat {
    /// JSON credential with an embedded proof (`ldp_vc`).
    LdpVc,
    /// Compact JWS (`jwt_vc`).
    JwtVc,
}

impl CredentialFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LdpVc => "ldp_vc",
            Self::JwtVc => "jwt_vc",
        }
    }

    /// Guess the format from raw bytes. `None` when neither shape fits.
    pub fn detect(raw: &[u8]) -> Option<Self> {
        let text = decode_text(raw).ok()?;
        let text = text.trim();
        if text.starts_with('{') {
            Some(Self::LdpVc)
        } else if is_compact_jws(text) {
            Some(Self::JwtVc)
        } else {
            None
        }
    }
}

/// Three non-empty base64url segments separated by dots.
pub fn is_compact_jws(text: &str) -> bool {
    let segments: Vec<&str> = text.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|s| {
            !s.is_empty()
                && s.bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}

/// The result of verifying one proof.
#[derive(Debug, Clone)]
pub struct ProofResult {
    pub verification_method: String,
    pub ok: bool,
    /// Empty when `ok`.
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Single(String),
    Array(Vec<Value>),
}

impl Default for ContextValue {
    fn default() -> Self {
        Self::Array(vec![Value::String(VC_CONTEXT_V1.to_string())])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CredentialTypeValue {
    Single(String),
    Array(Vec<String>),
}

impl CredentialTypeValue {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Self::Single(s) => s == name,
            Self::Array(arr) => arr.iter().any(|s| s == name),
        }
    }
}

/// `issuer` is either an identifier or an object with an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IssuerValue {
    Id(String),
    Object {
        id: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

impl IssuerValue {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Object { id, .. } => id,
        }
    }
}

/// A single proof, an array of proofs, or none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProofValue {
    Single(Box<Proof>),
    Array(Vec<Proof>),
}

impl Default for ProofValue {
    fn default() -> Self {
        Self::Array(Vec::new())
    }
}

impl ProofValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(_) => false,
            Self::Array(arr) => arr.is_empty(),
        }
    }

    pub fn as_list(&self) -> Vec<&Proof> {
        match self {
            Self::Single(p) => vec![p.as_ref()],
            Self::Array(arr) => arr.iter().collect(),
        }
    }

    pub fn push(&mut self, proof: Proof) {
        match self {
            Self::Single(existing) => {
                let prev = (**existing).clone();
                *self = Self::Array(vec![prev, proof]);
            }
            Self::Array(arr) => arr.push(proof),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: ContextValue,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub credential_type: CredentialTypeValue,

    pub issuer: IssuerValue,

    #[serde(rename = "issuanceDate")]
    pub issuance_date: DateTime<Utc>,

    #[serde(rename = "expirationDate", default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    #[serde(rename = "credentialSubject")]
    pub credential_subject: Value,

    #[serde(default, skip_serializing_if = "ProofValue::is_empty")]
    pub proof: ProofValue,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiableCredential {
    /// Parse a JSON credential from artifact bytes (any supported text
    /// encoding). A compact JWS is reported as an unsupported format.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, VcError> {
        let text = decode_text(raw).map_err(|e| VcError::UnsupportedFormat(e.to_string()))?;
        if is_compact_jws(text.trim()) {
            return Err(VcError::UnsupportedFormat(
                "compact JWS credentials are not verified".to_string(),
            ));
        }
        let vc: Self = serde_json::from_str(&text)?;
        if !vc.credential_type.contains(VERIFIABLE_CREDENTIAL_TYPE) {
            return Err(VcError::UnsupportedFormat(format!(
                "type does not include {VERIFIABLE_CREDENTIAL_TYPE}"
            )));
        }
        Ok(vc)
    }

    pub fn issuer_id(&self) -> &str {
        self.issuer.id()
    }

    /// Canonical bytes of the credential without `proof`.
    pub fn signing_input(&self) -> Result<CanonicalBytes, VcError> {
        let mut val = serde_json::to_value(self)?;
        if let Some(obj) = val.as_object_mut() {
            obj.remove("proof");
        }
        Ok(CanonicalBytes::new(&val)?)
    }

    /// Sign with `keypair` and append an `Ed25519Signature2020` proof.
    pub fn sign_ed25519(
        &mut self,
        keypair: &Ed25519KeyPair,
        verification_method: impl Into<String>,
    ) -> Result<(), VcError> {
        let canonical = self.signing_input()?;
        let signature = keypair.sign(&canonical);
        self.proof
            .push(Proof::new_ed25519(verification_method.into(), signature.to_hex()));
        Ok(())
    }

    /// Check every proof. An expired credential fails all proofs without
    /// checking signatures.
    pub fn verify(&self, resolver: &dyn KeyResolver) -> Vec<ProofResult> {
        let proofs = self.proof.as_list();
        let failed = |error: String| -> Vec<ProofResult> {
            proofs
                .iter()
                .map(|p| ProofResult {
                    verification_method: p.verification_method.clone(),
                    ok: false,
                    error: error.clone(),
                })
                .collect()
        };

        if let Some(expiration) = self.expiration_date {
            if expiration < Utc::now() {
                return failed(format!("credential expired at {expiration}"));
            }
        }
        let canonical = match self.signing_input() {
            Ok(c) => c,
            Err(e) => return failed(format!("canonicalization failed: {e}")),
        };

        proofs
            .iter()
            .map(|proof| {
                let verification_method = proof.verification_method.clone();
                match self.verify_single_proof(proof, &canonical, resolver) {
                    Ok(()) => ProofResult {
                        verification_method,
                        ok: true,
                        error: String::new(),
                    },
                    Err(e) => ProofResult {
                        verification_method,
                        ok: false,
                        error: e.to_string(),
                    },
                }
            })
            .collect()
    }

    /// `Ok(())` only if there is at least one proof and all of them verify.
    pub fn verify_all(&self, resolver: &dyn KeyResolver) -> Result<(), VcError> {
        let results = self.verify(resolver);
        if results.is_empty() {
            return Err(VcError::NoProofs);
        }
        for r in &results {
            if !r.ok {
                return Err(VcError::VerificationFailed(format!(
                    "proof from {} failed: {}",
                    r.verification_method, r.error
                )));
            }
        }
        Ok(())
    }

    fn verify_single_proof(
        &self,
        proof: &Proof,
        canonical: &CanonicalBytes,
        resolver: &dyn KeyResolver,
    ) -> Result<(), VcError> {
        if !proof.proof_type.is_ed25519() {
            return Err(VcError::UnsupportedProofType(proof.proof_type.to_string()));
        }
        let key = resolver.resolve(&proof.verification_method, self.issuer_id())?;
        let signature = Ed25519Signature::from_hex(&proof.proof_value)?;
        verify(canonical, &signature, &key)
    }
}
