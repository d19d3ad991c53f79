//! # Conformance Attestations
//!
//! An attestation is a credential asserting the outcome of one finalized
//! report. Its subject carries the report identity and verdict, the SHA-256
//! of the report's canonical JSON (`reportHash`), and the `(sha256, uri,
//! type)` of every artifact the run recorded.
//!
//! Verification checks the proofs and, when the report is at hand, that it
//! still hashes to `reportHash`.

use chrono::{SubsecRound, Utc};
use dpp_core::{canonical_digest, ArtifactKind, CanonicalBytes, ConformanceReport, ContentDigest};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::credential::{
    ContextValue, CredentialTypeValue, IssuerValue, ProofValue, VerifiableCredential,
    VERIFIABLE_CREDENTIAL_TYPE,
};
use crate::ed25519::Ed25519KeyPair;
use crate::error::VcError;
use crate::resolver::KeyResolver;

pub const ATTESTATION_TYPE: &str = "ConformanceAttestation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedProfile {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestedArtifact {
    pub sha256: ContentDigest,
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
}

/// The `credentialSubject` of an attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationSubject {
    /// The report target.
    pub id: String,
    pub profile: AttestedProfile,
    pub passed: bool,
    pub report_hash: ContentDigest,
    pub artifacts: Vec<AttestedArtifact>,
}

impl AttestationSubject {
    /// Project a finalized report.
    pub fn from_report(report: &ConformanceReport) -> Result<Self, VcError> {
        let passed = report.passed().ok_or_else(|| VcError::NotFinalized {
            target: report.target().to_string(),
        })?;
        Ok(Self {
            id: report.target().to_string(),
            profile: AttestedProfile {
                id: report.profile_id().to_string(),
                version: report.profile_version().to_string(),
            },
            passed,
            report_hash: report_hash(report)?,
            artifacts: report
                .artifacts()
                .iter()
                .map(|a| AttestedArtifact {
                    sha256: a.sha256,
                    uri: a.uri.clone(),
                    kind: a.kind,
                })
                .collect(),
        })
    }
}

/// SHA-256 of the report's canonical JSON (sorted keys, compact).
pub fn report_hash(report: &ConformanceReport) -> Result<ContentDigest, VcError> {
    Ok(canonical_digest(&CanonicalBytes::new(report)?))
}

/// Issue a signed attestation for a finalized report.
pub fn issue_attestation(
    report: &ConformanceReport,
    issuer: &str,
    keypair: &Ed25519KeyPair,
    verification_method: &str,
) -> Result<VerifiableCredential, VcError> {
    let subject = AttestationSubject::from_report(report)?;
    let mut vc = VerifiableCredential {
        context: ContextValue::default(),
        id: Some(format!("urn:uuid:{}", uuid::Uuid::new_v4())),
        credential_type: CredentialTypeValue::Array(vec![
            VERIFIABLE_CREDENTIAL_TYPE.to_string(),
            ATTESTATION_TYPE.to_string(),
        ]),
        issuer: IssuerValue::Id(issuer.to_string()),
        issuance_date: Utc::now().trunc_subsecs(0),
        expiration_date: None,
        credential_subject: serde_json::to_value(&subject)?,
        proof: ProofValue::default(),
        extra: Map::new(),
    };
    vc.sign_ed25519(keypair, verification_method)?;
    tracing::info!(
        subject = %subject.id,
        passed = subject.passed,
        report_hash = %subject.report_hash,
        "issued conformance attestation"
    );
    Ok(vc)
}

/// Verify an attestation's proofs and, if given, the report it attests.
pub fn verify_attestation(
    vc: &VerifiableCredential,
    resolver: &dyn KeyResolver,
    report: Option<&ConformanceReport>,
) -> Result<AttestationSubject, VcError> {
    if !vc.credential_type.contains(ATTESTATION_TYPE) {
        return Err(VcError::InvalidAttestation(format!(
            "type does not include {ATTESTATION_TYPE}"
        )));
    }
    let subject: AttestationSubject = serde_json::from_value(vc.credential_subject.clone())
        .map_err(|e| VcError::InvalidAttestation(format!("credentialSubject: {e}")))?;
    vc.verify_all(resolver)?;

    if let Some(report) = report {
        let actual = report_hash(report)?;
        if actual != subject.report_hash {
            return Err(VcError::ReportHashMismatch {
                attested: subject.report_hash.to_hex(),
                actual: actual.to_hex(),
            });
        }
    }
    Ok(subject)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticKeyResolver;
    use dpp_core::{Artifact, ArtifactRecord, Finding};

    const ISSUER: &str = "did:web:lab.example";
    const VM: &str = "did:web:lab.example#key-1";

    fn finalized_report() -> ConformanceReport {
        let mut report = ConformanceReport::new("file:///p.json", "espr-core", "0.1.0");
        let payload = Artifact::new(
            "file:///p.json",
            Some("application/json".into()),
            ArtifactKind::PayloadDocument,
            br#"{"id":"example-1"}"#.to_vec(),
        );
        report.add_artifact(ArtifactRecord::from(&payload));
        report.add_finding(Finding::info("resolve-input", "Resolved input to file"));
        report.finalize();
        report
    }

    fn resolver(kp: &Ed25519KeyPair) -> StaticKeyResolver {
        let mut r = StaticKeyResolver::new();
        r.insert(VM, kp.public_key());
        r
    }

    #[test]
    fn issue_and_verify() {
        let kp = Ed25519KeyPair::generate();
        let report = finalized_report();
        let vc = issue_attestation(&report, ISSUER, &kp, VM).unwrap();

        assert!(vc.id.as_deref().unwrap().starts_with("urn:uuid:"));
        assert_eq!(vc.issuer_id(), ISSUER);
        let subject = verify_attestation(&vc, &resolver(&kp), Some(&report)).unwrap();
        assert!(subject.passed);
        assert_eq!(subject.profile.id, "espr-core");
        assert_eq!(subject.artifacts.len(), 1);
        assert_eq!(subject.artifacts[0].kind, ArtifactKind::PayloadDocument);
        assert_eq!(subject.report_hash, report_hash(&report).unwrap());
    }

    #[test]
    fn subject_uses_stable_field_names() {
        let kp = Ed25519KeyPair::generate();
        let vc = issue_attestation(&finalized_report(), ISSUER, &kp, VM).unwrap();
        let value = serde_json::to_value(&vc).unwrap();
        let subject = &value["credentialSubject"];
        assert_eq!(subject["id"], "file:///p.json");
        assert_eq!(subject["profile"]["version"], "0.1.0");
        assert!(subject["reportHash"].is_string());
        assert_eq!(subject["artifacts"][0]["type"], "dpp_payload");
        assert!(value["issuanceDate"].is_string());
    }

    #[test]
    fn unfinalized_report_is_refused() {
        let kp = Ed25519KeyPair::generate();
        let report = ConformanceReport::new("t", "p", "1");
        assert!(matches!(
            issue_attestation(&report, ISSUER, &kp, VM),
            Err(VcError::NotFinalized { .. })
        ));
    }

    #[test]
    fn modified_report_is_detected() {
        let kp = Ed25519KeyPair::generate();
        let report = finalized_report();
        let vc = issue_attestation(&report, ISSUER, &kp, VM).unwrap();

        let mut altered = report.clone();
        altered.add_finding(Finding::error("schema-validation", "late finding"));
        assert!(matches!(
            verify_attestation(&vc, &resolver(&kp), Some(&altered)),
            Err(VcError::ReportHashMismatch { .. })
        ));
    }

    #[test]
    fn survives_serialization_roundtrip() {
        let kp = Ed25519KeyPair::generate();
        let report = finalized_report();
        let vc = issue_attestation(&report, ISSUER, &kp, VM).unwrap();
        let json = serde_json::to_string_pretty(&vc).unwrap();
        let parsed = VerifiableCredential::from_bytes(json.as_bytes()).unwrap();

        let report_json = serde_json::to_string(&report).unwrap();
        let reloaded: ConformanceReport = serde_json::from_str(&report_json).unwrap();
        verify_attestation(&parsed, &resolver(&kp), Some(&reloaded)).unwrap();
    }

    #[test]
    fn wrong_key_fails() {
        let kp = Ed25519KeyPair::generate();
        let other = Ed25519KeyPair::generate();
        let vc = issue_attestation(&finalized_report(), ISSUER, &kp, VM).unwrap();
        assert!(verify_attestation(&vc, &resolver(&other), None).is_err());
    }
}
