//! Policy errors.
//!
//! File-level errors reject a whole rule file. Entry-level errors reject
//! one rule and are reported as findings while the rest still run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// The rule file bytes are not text.
    #[error("rule file {uri} is not decodable text: {reason}")]
    Decode { uri: String, reason: String },

    /// The rule file is not a YAML/JSON document of the expected shape.
    #[error("rule file {uri} is malformed: {reason}")]
    Parse { uri: String, reason: String },

    /// One rule entry could not be compiled.
    #[error("rule {} (entry {index}) is invalid: {reason}", id.as_deref().unwrap_or("<no id>"))]
    InvalidRule {
        index: usize,
        id: Option<String>,
        reason: String,
    },

    /// The selector is not a valid JSONPath expression.
    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The assertion is not `exists`, `equals:<v>` or `regex:<p>`.
    #[error("invalid assertion {assertion:?}: {reason}")]
    InvalidAssertion { assertion: String, reason: String },
}
