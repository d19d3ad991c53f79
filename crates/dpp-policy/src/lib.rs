//! # dpp-policy: Policy Rule Engine
//!
//! Profile-declared checks over the JSON payload: each rule pairs a JSONPath
//! selector (RFC 9535) with an `exists`, `equals:<value>` or
//! `regex:<pattern>` assertion.
//!
//! - **Rules** (`rule.rs`): rule file parsing and per-entry compilation.
//! - **Engine** (`engine.rs`): evaluation against the first payload
//!   document, producing report findings.
//!
//! A rule file that cannot be read at all is a [`PolicyError`]. Anything
//! that goes wrong with a single rule becomes a finding.

pub mod engine;
pub mod error;
pub mod rule;

pub use engine::{match_string, PolicyEngine, PolicySubject};
pub use error::PolicyError;
pub use rule::{Assertion, PolicyRule, RejectedRule, RuleSet};
