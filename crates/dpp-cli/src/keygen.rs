//! # Keygen Subcommand
//!
//! Creates an Ed25519 signing seed for `dppctl attest`. The seed file holds
//! 64 hex characters; the public key is printed for distribution.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use dpp_vc::Ed25519KeyPair;

/// Arguments for `dppctl keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the hex-encoded seed.
    #[arg(long, short)]
    pub output: PathBuf,

    /// Overwrite an existing seed file.
    #[arg(long)]
    pub force: bool,
}

/// Execute `dppctl keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let keypair = generate(&args.output, args.force)?;
    println!("OK: generated Ed25519 key");
    println!("  Seed:       {}", args.output.display());
    println!("  Public key: {}", keypair.public_key().to_hex());
    Ok(0)
}

/// Generate a key and write its seed to `path`.
pub fn generate(path: &Path, force: bool) -> Result<Ed25519KeyPair> {
    if path.exists() && !force {
        bail!("refusing to overwrite existing key: {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let keypair = Ed25519KeyPair::generate();
    std::fs::write(path, keypair.seed_hex())
        .with_context(|| format!("failed to write key: {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote signing seed");
    Ok(keypair)
}

/// Load a key pair from a seed file written by [`generate()`].
pub fn read_keypair(path: &Path) -> Result<Ed25519KeyPair> {
    let hex = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key: {}", path.display()))?;
    Ed25519KeyPair::from_seed_hex(hex.trim())
        .with_context(|| format!("invalid key seed in {}", path.display()))
}
