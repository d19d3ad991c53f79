//! # dpp-core: Foundational Types for dppkit
//!
//! The value types every other crate in the workspace shares: the
//! [`Artifact`] flowing through a conformance run, its [`ContentDigest`],
//! the [`classify()`] input classifier, tolerant byte decoding, and the
//! [`ConformanceReport`] that accumulates findings.
//!
//! ## Key Design Principles
//!
//! 1. **Artifacts are immutable.** The digest is computed at construction
//!    from the bytes held. Derived content is a new artifact.
//!
//! 2. **Closed kind set.** [`ArtifactKind`] is an enum with a total mapping
//!    to [`ContentGrammar`]; adding a kind forces every `match` to handle it.
//!
//! 3. **Centralized report mutation.** `add_finding`, `add_artifact` and
//!    `finalize` are the only ways to change a report.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dpp-*` crates.
//! - No network I/O. The classifier's file-existence probe is the only
//!   filesystem access.
//! - No `.unwrap()` outside tests.

pub mod artifact;
pub mod canonical;
pub mod classify;
pub mod codec;
pub mod digest;
pub mod digital_link;
pub mod error;
pub mod report;
pub mod rules;

pub use artifact::{sniff_json_kind, Artifact, ArtifactKind, ContentGrammar};
pub use canonical::CanonicalBytes;
pub use classify::{classify, ClassifiedInput, InputKind};
pub use codec::{decode_json, decode_text, JsonDecodeError};
pub use digest::{canonical_digest, sha256_digest, sha256_hex, ContentDigest};
pub use digital_link::DigitalLink;
pub use error::{CoreError, DecodeError};
pub use report::{ArtifactRecord, ConformanceReport, Finding, Severity};
