//! # dpp-engine: Conformance Orchestration
//!
//! Ties the workspace together. [`run()`] takes a target reference, a
//! profile reference and an artifacts directory, and returns a finalized
//! [`ConformanceReport`] or a [`FatalError`].
//!
//! ## Failure classes
//!
//! - **Fatal**: the profile does not load, or the initial target cannot be
//!   ingested (missing file, HTTP error, timeout, DID target). No report.
//! - **Finding**: everything after ingestion. Validator errors and panics
//!   are caught per (companion, payload) pair and recorded with a
//!   stage-specific rule id from [`dpp_core::rules`].
//!
//! ## Extension points
//!
//! [`Engine`] accepts a custom [`Fetcher`](dpp_ingest::Fetcher), per-kind
//! [`Validator`]s and a [`KeyResolver`](dpp_vc::KeyResolver) for credential
//! proofs.

pub mod config;
pub mod engine;
pub mod error;
pub mod trust;
pub mod validator;

pub use config::EngineConfig;
pub use engine::{isolate, Engine};
pub use error::FatalError;
pub use validator::{
    severity_for, ContractStub, JsonSchemaValidator, ShaclValidator, ValidationContext, Validator,
    ValidatorError, ValidatorRegistry, MAX_EVIDENCE_RESULTS,
};

pub use dpp_core::ConformanceReport;

use std::path::Path;

/// Run one conformance check with configuration from the environment.
pub fn run(
    target: &str,
    profile_ref: &str,
    artifacts_dir: impl AsRef<Path>,
) -> Result<ConformanceReport, FatalError> {
    let config = EngineConfig::from_env()?;
    Engine::new(config).run(target, profile_ref, artifacts_dir.as_ref())
}
