//! # dpp-vc: Verifiable Credentials and Attestations
//!
//! - **Keys** ([`ed25519`]): Ed25519 key pairs, public keys and signatures
//!   with hex serde.
//! - **Credentials** ([`VerifiableCredential`]): the W3C envelope with
//!   embedded `Ed25519Signature2020` proofs over canonical JSON.
//! - **Attestations** ([`issue_attestation`], [`verify_attestation`]): a
//!   signed statement of one finalized conformance report.
//! - **Key resolution** ([`KeyResolver`]): how a verification method maps
//!   to a public key. DID resolution is left to implementors.
//!
//! All signing input is [`CanonicalBytes`](dpp_core::CanonicalBytes); raw
//! `serde_json::to_vec()` output is never signed.

pub mod attestation;
pub mod credential;
pub mod ed25519;
pub mod error;
pub mod proof;
pub mod resolver;

pub use attestation::{
    issue_attestation, report_hash, verify_attestation, AttestationSubject, AttestedArtifact,
    AttestedProfile, ATTESTATION_TYPE,
};
pub use credential::{
    is_compact_jws, ContextValue, CredentialFormat, CredentialTypeValue, IssuerValue, ProofResult,
    ProofValue, VerifiableCredential,
};
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::VcError;
pub use proof::{Proof, ProofPurpose, ProofType};
pub use resolver::{KeyResolver, StaticKeyResolver};
