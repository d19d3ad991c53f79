//! # Verify Subcommand
//!
//! Checks an attestation's Ed25519 proof against a pinned public key and,
//! when a report is supplied, that the credential attests exactly that
//! report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use dpp_core::ConformanceReport;
use dpp_vc::{verify_attestation, Ed25519PublicKey, StaticKeyResolver, VerifiableCredential};

use crate::{read_json, EXIT_FAILED, EXIT_PASSED};

/// Arguments for `dppctl verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Attestation written by `dppctl attest`.
    #[arg(long)]
    pub credential: PathBuf,

    /// Issuer public key, 64 hex characters.
    #[arg(long)]
    pub public_key: String,

    /// Report to compare against the attested hash.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Execute `dppctl verify`.
pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let raw = std::fs::read(&args.credential)
        .with_context(|| format!("failed to read {}", args.credential.display()))?;
    let vc = VerifiableCredential::from_bytes(&raw)
        .with_context(|| format!("failed to parse credential: {}", args.credential.display()))?;
    let key = Ed25519PublicKey::from_hex(args.public_key.trim()).context("invalid public key")?;
    let report = args
        .report
        .as_deref()
        .map(read_json::<ConformanceReport>)
        .transpose()?;

    let resolver = StaticKeyResolver::single(key);
    match verify_attestation(&vc, &resolver, report.as_ref()) {
        Ok(subject) => {
            println!("OK: attestation is valid");
            println!("  Issuer:  {}", vc.issuer_id());
            println!("  Subject: {}", subject.id);
            println!("  Profile: {} {}", subject.profile.id, subject.profile.version);
            println!("  Passed:  {}", subject.passed);
            Ok(EXIT_PASSED)
        }
        Err(e) => {
            tracing::warn!(credential = %args.credential.display(), error = %e, "attestation rejected");
            println!("FAIL: {e}");
            Ok(EXIT_FAILED)
        }
    }
}
