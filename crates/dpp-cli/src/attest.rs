//! # Attest Subcommand
//!
//! Signs a finalized conformance report as a `ConformanceAttestation`
//! credential.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use dpp_core::ConformanceReport;
use dpp_vc::{issue_attestation, report_hash};

use crate::keygen::read_keypair;
use crate::{read_json, write_json};

/// Arguments for `dppctl attest`.
#[derive(Args, Debug)]
pub struct AttestArgs {
    /// Report written by `dppctl check`.
    #[arg(long)]
    pub report: PathBuf,

    /// Issuer id, usually a DID.
    #[arg(long)]
    pub issuer: String,

    /// Seed file written by `dppctl keygen`.
    #[arg(long)]
    pub key: PathBuf,

    /// Verification method for the proof (default: `<issuer>#key-1`).
    #[arg(long)]
    pub verification_method: Option<String>,

    /// Where to write the credential.
    #[arg(long, short, default_value = "attestation.json")]
    pub output: PathBuf,
}

impl AttestArgs {
    pub fn verification_method(&self) -> String {
        self.verification_method
            .clone()
            .unwrap_or_else(|| format!("{}#key-1", self.issuer))
    }
}

/// Execute `dppctl attest`.
pub fn run_attest(args: &AttestArgs) -> Result<u8> {
    let report: ConformanceReport = read_json(&args.report)?;
    let keypair = read_keypair(&args.key)?;

    let vc = issue_attestation(&report, &args.issuer, &keypair, &args.verification_method())
        .with_context(|| format!("failed to attest {}", args.report.display()))?;
    write_json(&args.output, &vc)?;

    let hash = report_hash(&report).context("failed to hash report")?;
    println!("OK: attestation written to {}", args.output.display());
    println!("  Subject:     {}", report.target());
    println!("  Passed:      {}", report.passed().unwrap_or(false));
    println!("  Report hash: {hash}");
    Ok(0)
}
