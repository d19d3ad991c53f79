//! # dpp-ingest: Ingestion Adapters
//!
//! Turns a classified target into artifacts:
//!
//! - [`HttpFetcher`] for URLs and structured-identifier links
//! - [`read_file`] for local paths
//! - [`ArchiveExpander`] for AASX packages
//!
//! and persists them with [`ArtifactStore`].
//!
//! [`ingest()`] dispatches on the classified kind. Its errors are the fatal
//! class of a conformance run: without an initial artifact there is nothing
//! to validate.

pub mod archive;
pub mod config;
pub mod error;
pub mod file;
pub mod http;
pub mod store;

pub use archive::{ArchiveExpander, EntryFailure, Expansion};
pub use config::{ConfigError, FetchConfig};
pub use error::{IngestError, StoreError};
pub use file::read_file;
pub use http::{Fetcher, HttpFetcher};
pub use store::ArtifactStore;

use std::path::Path;

use dpp_core::{Artifact, ClassifiedInput, InputKind};

/// Produce the initial artifact for a classified target.
pub fn ingest(input: &ClassifiedInput, fetcher: &dyn Fetcher) -> Result<Artifact, IngestError> {
    match input.kind {
        InputKind::Url | InputKind::DigitalLink => fetcher.fetch(&input.canonical),
        InputKind::File => read_file(Path::new(&input.canonical)),
        InputKind::Did => Err(IngestError::UnsupportedInput {
            kind: input.kind,
            target: input.canonical.clone(),
        }),
    }
}
