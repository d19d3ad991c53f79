//! # Check Subcommand
//!
//! Runs the conformance engine against one target and writes the report.
//! A fatal error leaves no report behind.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use dpp_core::{ConformanceReport, Severity};
use dpp_engine::{Engine, EngineConfig};

use crate::{write_json, EXIT_FAILED, EXIT_PASSED};

/// Arguments for `dppctl check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Target: URL, GS1 Digital Link, file path or DID.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Profile id under the profiles directory, or a path to a manifest.
    #[arg(long, short)]
    pub profile: String,

    /// Where to write the report.
    #[arg(long, short, default_value = "report.json")]
    pub output: PathBuf,

    /// Directory for content-addressed artifacts.
    #[arg(long, default_value = "artifacts")]
    pub artifacts_dir: PathBuf,

    /// Network timeout in seconds (overrides DPP_FETCH_TIMEOUT_SECS).
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Root of bundled profiles (overrides DPP_PROFILES_DIR).
    #[arg(long)]
    pub profiles_dir: Option<PathBuf>,
}

impl CheckArgs {
    /// Environment configuration with flag overrides applied.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::from_env().context("invalid environment configuration")?;
        if let Some(dir) = &self.profiles_dir {
            config = config.with_profiles_dir(dir);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        Ok(config)
    }
}

/// Execute `dppctl check`.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let engine = Engine::new(args.engine_config()?);
    tracing::debug!(?engine, "engine configured");

    let report = engine
        .run(&args.target, &args.profile, &args.artifacts_dir)
        .with_context(|| format!("conformance check of {} aborted", args.target))?;

    write_json(&args.output, &report)?;
    print_summary(&report, &args.output);

    Ok(if report.passed() == Some(true) {
        EXIT_PASSED
    } else {
        EXIT_FAILED
    })
}

fn print_summary(report: &ConformanceReport, output: &std::path::Path) {
    let status = if report.passed() == Some(true) { "OK" } else { "FAIL" };
    println!(
        "{status}: {} against {} {}",
        report.target(),
        report.profile_id(),
        report.profile_version()
    );
    println!("  Artifacts: {}", report.artifacts().len());
    println!(
        "  Findings:  {} ({} errors, {} warnings)",
        report.findings().len(),
        report.count_at_least(Severity::Error),
        report.findings().iter().filter(|f| f.severity == Severity::Warning).count()
    );
    for finding in report.findings().iter().filter(|f| f.severity.is_failing()) {
        println!("  [{}] {}: {}", finding.severity, finding.rule_id, finding.message);
    }
    println!("  Report:    {}", output.display());
}
