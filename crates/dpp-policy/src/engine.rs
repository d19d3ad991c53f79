//! # Rule Evaluation
//!
//! Rules run against the first payload document among a run's artifacts.
//! Each rule yields at most one finding:
//!
//! - no payload document: an error finding under the rule id
//! - the payload is not JSON, or the query fails: an error finding
//!   carrying the error text
//! - the assertion fails: a finding at the rule's declared severity
//! - the assertion holds: nothing
//!
//! Evaluation never returns an error. The engine is an immutable value, so
//! rules can be evaluated in any order or concurrently.

use dpp_core::rules::POLICY_RULES_LOAD_ERROR;
use dpp_core::{decode_json, Artifact, ArtifactKind, Finding};
use serde_json::Value;

use crate::rule::{PolicyRule, RuleSet};

/// The payload a rule set is evaluated against.
#[derive(Debug)]
pub struct PolicySubject<'a> {
    artifact: &'a Artifact,
    document: Result<Value, String>,
}

impl<'a> PolicySubject<'a> {
    /// Pick the first payload document and decode it once.
    pub fn select(artifacts: &'a [Artifact]) -> Option<Self> {
        let artifact = artifacts
            .iter()
            .find(|a| a.kind() == ArtifactKind::PayloadDocument)?;
        let document = decode_json(artifact.bytes()).map_err(|e| e.to_string());
        Some(Self { artifact, document })
    }

    pub fn artifact(&self) -> &'a Artifact {
        self.artifact
    }
}

/// String form of a matched value: strings as-is, everything else as JSON.
pub fn match_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluates the rules of one rule file.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    rules: RuleSet,
}

impl PolicyEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules.rules
    }

    /// Findings for entries that failed to load.
    ///
    /// An entry with an id reports under that id; one without reports under
    /// `policy-rules-load-error`.
    pub fn load_findings(&self) -> Vec<Finding> {
        self.rules
            .rejected
            .iter()
            .map(|rejected| {
                let rule_id = rejected.id.as_deref().unwrap_or(POLICY_RULES_LOAD_ERROR);
                Finding::error(rule_id, format!("Invalid policy rule: {}", rejected.reason))
                    .with_evidence("rules_file", self.rules.source.clone())
                    .with_evidence("entry", rejected.index)
            })
            .collect()
    }

    /// Evaluate one rule.
    pub fn evaluate_rule(&self, rule: &PolicyRule, subject: Option<&PolicySubject<'_>>) -> Option<Finding> {
        let Some(subject) = subject else {
            return Some(
                Finding::error(rule.id.as_str(), "No payload document available for policy evaluation")
                    .with_evidence("rule", rule.id.as_str())
                    .with_evidence("selector", rule.selector.as_str()),
            );
        };
        let artifact_hash = subject.artifact.sha256();
        let document = match &subject.document {
            Ok(document) => document,
            Err(reason) => {
                return Some(
                    Finding::error(rule.id.as_str(), format!("Policy query failed: {reason}"))
                        .with_evidence("rule", rule.id.as_str())
                        .with_evidence("selector", rule.selector.as_str())
                        .with_evidence("artifact_hash", artifact_hash),
                );
            }
        };

        let nodes = rule.path().query(document).all();
        let matches: Vec<String> = nodes.iter().map(|v| match_string(v)).collect();
        if rule.assertion.holds(&matches) {
            tracing::trace!(rule = %rule.id, matches = matches.len(), "policy rule passed");
            return None;
        }
        tracing::debug!(rule = %rule.id, matches = matches.len(), "policy rule failed");
        let matched_values: Vec<Value> = nodes.into_iter().cloned().collect();
        Some(
            Finding::new(rule.id.as_str(), rule.severity, rule.render_message(matches.len()))
                .with_evidence("rule", rule.id.as_str())
                .with_evidence("selector", rule.selector.as_str())
                .with_evidence("assertion", rule.assertion.to_string())
                .with_evidence("matches", matched_values)
                .with_evidence("artifact_hash", artifact_hash),
        )
    }

    /// Load findings plus one evaluation per compiled rule.
    pub fn evaluate(&self, artifacts: &[Artifact]) -> Vec<Finding> {
        let subject = PolicySubject::select(artifacts);
        let mut findings = self.load_findings();
        findings.extend(
            self.rules()
                .iter()
                .filter_map(|rule| self.evaluate_rule(rule, subject.as_ref())),
        );
        findings
    }
}
