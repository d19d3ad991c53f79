//! # Trust Checks
//!
//! Every credential-token artifact in a run is checked against the
//! profile's [`TrustPolicy`]: accepted format, allowed issuer, and proof
//! verification through the engine's [`KeyResolver`].
//!
//! Compact JWS credentials are recognised but not verified; they get a
//! warning rather than a silent pass.

use dpp_core::{rules, Artifact, Finding};
use dpp_profile::TrustPolicy;
use dpp_vc::{CredentialFormat, KeyResolver, VcError, VerifiableCredential};

/// Findings for one credential-token artifact.
pub fn check_credential(
    artifact: &Artifact,
    policy: &TrustPolicy,
    resolver: Option<&dyn KeyResolver>,
) -> Vec<Finding> {
    let hash = artifact.sha256();
    let mut findings = Vec::new();

    if CredentialFormat::detect(artifact.bytes()) == Some(CredentialFormat::JwtVc) {
        findings.push(
            Finding::warning(
                rules::TRUST_CREDENTIAL_UNSUPPORTED_FORMAT,
                "Compact JWS credentials are not verified",
            )
            .with_evidence("artifact_hash", hash.clone())
            .with_evidence("format", CredentialFormat::JwtVc.as_str()),
        );
        findings.extend(format_finding(CredentialFormat::JwtVc, policy, &hash));
        return findings;
    }

    let vc = match VerifiableCredential::from_bytes(artifact.bytes()) {
        Ok(vc) => vc,
        Err(VcError::UnsupportedFormat(reason)) => {
            findings.push(
                Finding::warning(rules::TRUST_CREDENTIAL_UNSUPPORTED_FORMAT, reason)
                    .with_evidence("artifact_hash", hash),
            );
            return findings;
        }
        Err(e) => {
            findings.push(
                Finding::error(
                    rules::TRUST_CREDENTIAL_PARSE_ERROR,
                    format!("Credential could not be parsed: {e}"),
                )
                .with_evidence("artifact_hash", hash),
            );
            return findings;
        }
    };

    findings.extend(format_finding(CredentialFormat::LdpVc, policy, &hash));

    let issuer = vc.issuer_id();
    if !policy.allows_issuer(issuer) {
        findings.push(
            Finding::error(
                rules::TRUST_CREDENTIAL_ISSUER,
                format!("Issuer {issuer} is not allowed by the profile"),
            )
            .with_evidence("artifact_hash", hash.clone())
            .with_evidence("issuer", issuer)
            .with_evidence("allowed_issuers", policy.allowed_issuers.clone()),
        );
    }

    let Some(resolver) = resolver else {
        findings.push(
            Finding::warning(
                rules::TRUST_CREDENTIAL_UNVERIFIED,
                "No key resolver configured; credential proofs were not verified",
            )
            .with_evidence("artifact_hash", hash)
            .with_evidence("issuer", issuer),
        );
        return findings;
    };

    match vc.verify_all(resolver) {
        Ok(()) => {
            tracing::info!(issuer, "credential proofs verified");
            findings.push(
                Finding::info(
                    rules::TRUST_CREDENTIAL_VERIFIED,
                    format!("Credential from {issuer} verified"),
                )
                .with_evidence("artifact_hash", hash)
                .with_evidence("issuer", issuer),
            );
        }
        Err(e) => {
            tracing::warn!(issuer, error = %e, "credential verification failed");
            findings.push(
                Finding::error(
                    rules::TRUST_CREDENTIAL_SIGNATURE,
                    format!("Credential verification failed: {e}"),
                )
                .with_evidence("artifact_hash", hash)
                .with_evidence("issuer", issuer),
            );
        }
    }
    findings
}

fn format_finding(format: CredentialFormat, policy: &TrustPolicy, hash: &str) -> Option<Finding> {
    if policy.allows_format(format.as_str()) {
        return None;
    }
    Some(
        Finding::error(
            rules::TRUST_CREDENTIAL_FORMAT,
            format!("Credential format {} is not accepted by the profile", format.as_str()),
        )
        .with_evidence("artifact_hash", hash)
        .with_evidence("format", format.as_str())
        .with_evidence("vc_formats", policy.vc_formats.clone()),
    )
}
