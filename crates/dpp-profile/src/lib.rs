//! # dpp-profile: Conformance Profiles
//!
//! A profile is a named, versioned bundle of companion artifacts (JSON
//! Schemas, SHACL shapes, OpenAPI documents, policy rule files, JSON-LD
//! contexts) plus trust constraints. This crate parses manifests strictly
//! and resolves profile references to loaded, path-resolved [`Profile`]
//! values.
//!
//! Any error here is fatal to a conformance run: without a profile there is
//! nothing to check against.

pub mod error;
pub mod loader;
pub mod manifest;

pub use error::{ProfileError, ProfileResult};
pub use loader::{load_manifest, ProfileLoader, MANIFEST_FILE_NAME};
pub use manifest::{CompanionPaths, Profile, TrustPolicy, MANIFEST_VERSION};
