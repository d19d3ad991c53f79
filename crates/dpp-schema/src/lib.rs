//! # dpp-schema: JSON Schema Validation
//!
//! Validates payload documents against schema companions. Schemas may be
//! JSON or YAML; the draft is taken from `$schema` (Draft 2020-12 when
//! absent). `$ref`s to other files resolve against the schema's own
//! directory and never reach the network.
//!
//! Validation yields a list of [`Violation`]s; turning them into findings
//! is the orchestrator's job.

pub mod validate;

pub use validate::{
    load_schema_document, yaml_to_json_value, CompiledSchema, SchemaValidationError, Violation,
};
