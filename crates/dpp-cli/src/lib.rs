//! # dpp-cli: the `dppctl` command-line tool
//!
//! ## Subcommands
//!
//! - `dppctl check` runs a conformance check and writes the report.
//! - `dppctl attest` signs a finalized report as a conformance attestation.
//! - `dppctl verify` checks an attestation's proof and, optionally, the
//!   report it attests.
//! - `dppctl keygen` creates an Ed25519 signing seed.
//!
//! ```bash
//! dppctl check https://id.gs1.org/01/09506000134352 --profile espr-core
//! dppctl keygen --output lab.key
//! dppctl attest --report report.json --issuer did:web:lab.example --key lab.key
//! dppctl verify --credential attestation.json --public-key <hex> --report report.json
//! ```
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Run completed and passed; attestation verified |
//! | 1 | Run completed with failing findings; attestation rejected |
//! | 2 | Fatal error or bad usage; no report written |

pub mod attest;
pub mod check;
pub mod keygen;
pub mod logging;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};

pub const EXIT_PASSED: u8 = 0;
pub const EXIT_FAILED: u8 = 1;
pub const EXIT_FATAL: u8 = 2;

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Read and parse a JSON document.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON: {}", path.display()))
}
