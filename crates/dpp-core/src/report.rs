//! # Conformance Report
//!
//! The report accumulates [`ArtifactRecord`]s and [`Finding`]s during a run
//! and computes the final verdict.
//!
//! ## Invariants
//!
//! - `add_finding`, `add_artifact` and `finalize` are the only mutators.
//! - `passed` is `None` until [`ConformanceReport::finalize()`] runs. From
//!   then on it is `Some(true)` iff no finding has severity ≥ error.
//! - Records never carry raw bytes.
//!
//! Serialized field names (`target`, `profile_id`, `profile_version`,
//! `created_at`, `artifacts`, `findings`, `passed`) are a stable contract
//! with attestation consumers.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::artifact::{Artifact, ArtifactKind};
use crate::digest::ContentDigest;
use crate::error::CoreError;

/// Ordered severity scale: `info < warning < error < critical`.
///
/// Both `error` and `critical` fail a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// True for severities that make a report fail.
    pub fn is_failing(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "critical" => Ok(Self::Critical),
            other => Err(CoreError::UnknownSeverity(other.to_string())),
        }
    }
}

/// One reported observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub evidence: Option<BTreeMap<String, Value>>,
}

impl Finding {
    pub fn new(rule_id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            evidence: None,
        }
    }

    pub fn info(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Info, message)
    }

    pub fn warning(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Warning, message)
    }

    pub fn error(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(rule_id, Severity::Error, message)
    }

    /// Add one evidence entry.
    pub fn with_evidence(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.evidence
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up an evidence entry.
    pub fn evidence(&self, key: &str) -> Option<&Value> {
        self.evidence.as_ref().and_then(|e| e.get(key))
    }
}

/// Report-safe projection of an [`Artifact`]: everything except the bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub uri: String,
    pub sha256: ContentDigest,
    pub content_type: Option<String>,
    pub kind: ArtifactKind,
    pub size: usize,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl ArtifactRecord {
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl From<&Artifact> for ArtifactRecord {
    fn from(artifact: &Artifact) -> Self {
        Self {
            uri: artifact.uri().to_string(),
            sha256: artifact.digest(),
            content_type: artifact.content_type().map(str::to_string),
            kind: artifact.kind(),
            size: artifact.len(),
            metadata: artifact.metadata().clone(),
        }
    }
}

/// The outcome of one conformance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceReport {
    target: String,
    profile_id: String,
    profile_version: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    artifacts: Vec<ArtifactRecord>,
    #[serde(default)]
    findings: Vec<Finding>,
    #[serde(default)]
    passed: Option<bool>,
}

impl ConformanceReport {
    /// Open a report for `target` under the given profile identity.
    pub fn new(
        target: impl Into<String>,
        profile_id: impl Into<String>,
        profile_version: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            profile_id: profile_id.into(),
            profile_version: profile_version.into(),
            created_at: Utc::now(),
            artifacts: Vec::new(),
            findings: Vec::new(),
            passed: None,
        }
    }

    pub fn add_finding(&mut self, finding: Finding) {
        if self.passed.is_some() {
            tracing::warn!(rule_id = %finding.rule_id, "finding added to a finalized report");
            if finding.severity.is_failing() {
                self.passed = Some(false);
            }
        }
        self.findings.push(finding);
    }

    pub fn add_artifact(&mut self, record: ArtifactRecord) {
        self.artifacts.push(record);
    }

    /// Compute and fix the verdict. Returns it for convenience.
    pub fn finalize(&mut self) -> bool {
        let passed = !self.findings.iter().any(|f| f.severity.is_failing());
        self.passed = Some(passed);
        passed
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn profile_version(&self) -> &str {
        &self.profile_version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn artifacts(&self) -> &[ArtifactRecord] {
        &self.artifacts
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn passed(&self) -> Option<bool> {
        self.passed
    }

    pub fn is_finalized(&self) -> bool {
        self.passed.is_some()
    }

    /// Findings carrying `rule_id`.
    pub fn findings_for(&self, rule_id: &str) -> impl Iterator<Item = &Finding> {
        let rule_id = rule_id.to_string();
        self.findings.iter().filter(move |f| f.rule_id == rule_id)
    }

    /// Number of findings at or above `severity`.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity >= severity).count()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn severity() -> impl Strategy<Value = Severity> {
        prop_oneof![
            Just(Severity::Info),
            Just(Severity::Warning),
            Just(Severity::Error),
            Just(Severity::Critical),
        ]
    }

    proptest! {
        /// The verdict depends only on whether an error-or-above finding exists,
        /// not on ordering or on how many other findings surround it.
        #[test]
        fn finalize_is_monotonic(severities in prop::collection::vec(severity(), 0..32)) {
            let mut forward = ConformanceReport::new("t", "p", "1");
            let mut reversed = ConformanceReport::new("t", "p", "1");
            for (i, s) in severities.iter().enumerate() {
                forward.add_finding(Finding::new(format!("r{i}"), *s, "m"));
            }
            for (i, s) in severities.iter().enumerate().rev() {
                reversed.add_finding(Finding::new(format!("r{i}"), *s, "m"));
            }
            let expected = !severities.iter().any(|s| *s >= Severity::Error);
            prop_assert_eq!(forward.finalize(), expected);
            prop_assert_eq!(reversed.finalize(), expected);
        }

        /// Adding findings to a failed report never makes it pass.
        #[test]
        fn failure_is_sticky(extra in prop::collection::vec(severity(), 0..16)) {
            let mut report = ConformanceReport::new("t", "p", "1");
            report.add_finding(Finding::error("first", "m"));
            for s in extra {
                report.add_finding(Finding::new("later", s, "m"));
            }
            prop_assert!(!report.finalize());
        }
    }
}
