//! # dppctl entry point
//!
//! Parses arguments, installs the tracing subscriber and dispatches to
//! the subcommand handlers. Handler errors exit with code 2.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use dpp_cli::attest::{run_attest, AttestArgs};
use dpp_cli::check::{run_check, CheckArgs};
use dpp_cli::keygen::{run_keygen, KeygenArgs};
use dpp_cli::verify::{run_verify, VerifyArgs};
use dpp_cli::{logging, EXIT_FATAL};

/// Digital product passport conformance toolkit.
///
/// Checks passports against conformance profiles and issues signed
/// attestations of the results.
#[derive(Parser, Debug)]
#[command(name = "dppctl", version, about, long_about = None)]
struct Cli {
    /// Verbose logging. Repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a passport against a profile and write the report.
    Check(CheckArgs),

    /// Sign a report as a conformance attestation.
    Attest(AttestArgs),

    /// Verify an attestation and optionally the report it covers.
    Verify(VerifyArgs),

    /// Generate an Ed25519 signing seed.
    Keygen(KeygenArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "dppctl starting");

    let result = match &cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Attest(args) => run_attest(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Keygen(args) => run_keygen(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
