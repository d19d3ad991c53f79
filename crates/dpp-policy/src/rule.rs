//! # Policy Rules
//!
//! A rule file is YAML (or JSON, which YAML accepts) with a top-level
//! `rules` list:
//!
//! ```yaml
//! rules:
//!   - id: ESPR-ID-01
//!     severity: error
//!     selector: $.id
//!     assertion: exists
//!     message: "Passport must carry an identifier ({count} found)"
//!   - id: ESPR-LANG-01
//!     selector: $.language
//!     assertion: "regex:^[a-z]{2}$"
//! ```
//!
//! Entries are compiled one at a time. A bad entry lands in
//! [`RuleSet::rejected`] and does not stop the others from loading.

use std::fmt;
use std::str::FromStr;

use dpp_core::{decode_text, Artifact, Severity};
use regex::Regex;
use serde::Deserialize;
use serde_json_path::JsonPath;

use crate::error::PolicyError;

const DEFAULT_SEVERITY: Severity = Severity::Warning;

/// What a rule requires of the values its selector matched.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// At least one match.
    Exists,
    /// Some match's string form equals the value.
    Equals(String),
    /// Some match's string form contains a match for the pattern.
    Regex(Regex),
}

impl Assertion {
    /// Whether `matches` (string forms) satisfy the assertion.
    pub fn holds(&self, matches: &[String]) -> bool {
        match self {
            Self::Exists => !matches.is_empty(),
            Self::Equals(expected) => matches.iter().any(|m| m == expected),
            Self::Regex(pattern) => matches.iter().any(|m| pattern.is_match(m)),
        }
    }
}

impl FromStr for Assertion {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == "exists" {
            return Ok(Self::Exists);
        }
        if let Some(value) = trimmed.strip_prefix("equals:") {
            return Ok(Self::Equals(value.trim_start().to_string()));
        }
        if let Some(pattern) = trimmed.strip_prefix("regex:") {
            let pattern = pattern.trim_start();
            return Regex::new(pattern)
                .map(Self::Regex)
                .map_err(|e| PolicyError::InvalidAssertion {
                    assertion: s.to_string(),
                    reason: e.to_string(),
                });
        }
        Err(PolicyError::InvalidAssertion {
            assertion: s.to_string(),
            reason: "expected exists, equals:<value> or regex:<pattern>".to_string(),
        })
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => f.write_str("exists"),
            Self::Equals(v) => write!(f, "equals:{v}"),
            Self::Regex(p) => write!(f, "regex:{}", p.as_str()),
        }
    }
}

/// A rule entry as written in the file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    id: String,
    #[serde(default)]
    severity: Option<String>,
    selector: String,
    assertion: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// A compiled policy rule.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    pub id: String,
    pub severity: Severity,
    pub selector: String,
    pub assertion: Assertion,
    pub message: String,
    pub description: Option<String>,
    path: JsonPath,
}

impl PolicyRule {
    /// Compile a rule from its parts. The severity defaults to warning and
    /// the message to a generic description of the check.
    pub fn new(
        id: impl Into<String>,
        severity: Option<Severity>,
        selector: impl Into<String>,
        assertion: &str,
        message: Option<String>,
    ) -> Result<Self, PolicyError> {
        let id = id.into();
        let selector = selector.into();
        let path = JsonPath::parse(&selector).map_err(|e| PolicyError::InvalidSelector {
            selector: selector.clone(),
            reason: e.to_string(),
        })?;
        let assertion: Assertion = assertion.parse()?;
        let message = message
            .unwrap_or_else(|| format!("Policy rule {id} failed: {{selector}} {{assertion}}"));
        Ok(Self {
            id,
            severity: severity.unwrap_or(DEFAULT_SEVERITY),
            selector,
            assertion,
            message,
            description: None,
            path,
        })
    }

    fn from_raw(raw: RawRule, index: usize) -> Result<Self, PolicyError> {
        let severity = match raw.severity {
            Some(s) => Some(s.parse::<Severity>().map_err(|e| PolicyError::InvalidRule {
                index,
                id: Some(raw.id.clone()),
                reason: e.to_string(),
            })?),
            None => None,
        };
        let mut rule = Self::new(raw.id, severity, raw.selector, &raw.assertion, raw.message)?;
        rule.description = raw.description;
        Ok(rule)
    }

    /// The compiled selector.
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Expand `{selector}`, `{assertion}` and `{count}` in the message.
    pub fn render_message(&self, count: usize) -> String {
        self.message
            .replace("{selector}", &self.selector)
            .replace("{assertion}", &self.assertion.to_string())
            .replace("{count}", &count.to_string())
    }
}

/// An entry that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRule {
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// The compiled contents of one rule file. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub source: String,
    pub rules: Vec<PolicyRule>,
    pub rejected: Vec<RejectedRule>,
}

impl RuleSet {
    /// Parse a rule file. `source` labels errors and findings.
    ///
    /// A document without a `rules` key has no rules.
    pub fn parse(text: &str, source: &str) -> Result<Self, PolicyError> {
        let parse_error = |reason: String| PolicyError::Parse {
            uri: source.to_string(),
            reason,
        };
        let document: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
        let entries = match &document {
            serde_yaml::Value::Mapping(map) => match map.get("rules") {
                None | Some(serde_yaml::Value::Null) => Vec::new(),
                Some(serde_yaml::Value::Sequence(entries)) => entries.clone(),
                Some(_) => return Err(parse_error("`rules` must be a list".to_string())),
            },
            serde_yaml::Value::Null => Vec::new(),
            _ => return Err(parse_error("expected a mapping with a `rules` list".to_string())),
        };

        let mut set = RuleSet {
            source: source.to_string(),
            ..RuleSet::default()
        };
        for (index, entry) in entries.into_iter().enumerate() {
            let id = entry.get("id").and_then(|v| v.as_str()).map(str::to_string);
            let compiled = serde_yaml::from_value::<RawRule>(entry)
                .map_err(|e| PolicyError::InvalidRule {
                    index,
                    id: id.clone(),
                    reason: e.to_string(),
                })
                .and_then(|raw| PolicyRule::from_raw(raw, index));
            match compiled {
                Ok(rule) => set.rules.push(rule),
                Err(e) => {
                    tracing::warn!(source, index, id = ?id, error = %e, "rejected policy rule");
                    set.rejected.push(RejectedRule {
                        index,
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        tracing::debug!(source, rules = set.rules.len(), rejected = set.rejected.len(), "loaded rule file");
        Ok(set)
    }

    /// Parse a rule file artifact.
    pub fn from_artifact(artifact: &Artifact) -> Result<Self, PolicyError> {
        let text = decode_text(artifact.bytes()).map_err(|e| PolicyError::Decode {
            uri: artifact.uri().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text, artifact.uri())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertion_parsing() {
        assert!(matches!("exists".parse::<Assertion>().unwrap(), Assertion::Exists));
        assert!(matches!(
            "equals: EU".parse::<Assertion>().unwrap(),
            Assertion::Equals(v) if v == "EU"
        ));
        assert!(matches!("regex:^[0-9]+$".parse::<Assertion>().unwrap(), Assertion::Regex(_)));
        assert!("regex:(".parse::<Assertion>().is_err());
        assert!("contains:x".parse::<Assertion>().is_err());
    }

    #[test]
    fn assertion_semantics() {
        let values = vec!["09506000134352".to_string(), "EU".to_string()];
        assert!(Assertion::Exists.holds(&values));
        assert!(!Assertion::Exists.holds(&[]));
        assert!(Assertion::Equals("EU".into()).holds(&values));
        assert!(!Assertion::Equals("US".into()).holds(&values));
        assert!("regex:^[0-9]{14}$".parse::<Assertion>().unwrap().holds(&values));
        assert!(!"regex:^x".parse::<Assertion>().unwrap().holds(&values));
    }

    #[test]
    fn parses_rules_with_defaults() {
        let set = RuleSet::parse(
            "rules:\n  - id: R1\n    selector: $.id\n    assertion: exists\n",
            "rules.yaml",
        )
        .unwrap();
        assert_eq!(set.len(), 1);
        let rule = &set.rules[0];
        assert_eq!(rule.severity, Severity::Warning);
        assert!(rule.message.contains("R1"));
        assert!(set.rejected.is_empty());
    }

    #[test]
    fn json_rule_file_is_accepted() {
        let set = RuleSet::parse(
            r#"{"rules": [{"id": "R1", "severity": "critical", "selector": "$.a", "assertion": "equals:1"}]}"#,
            "rules.json",
        )
        .unwrap();
        assert_eq!(set.rules[0].severity, Severity::Critical);
    }

    #[test]
    fn bad_entries_are_rejected_individually() {
        let text = r#"
rules:
  - id: GOOD
    selector: $.id
    assertion: exists
  - id: BAD-SELECTOR
    selector: "$[?"
    assertion: exists
  - selector: $.x
    assertion: exists
  - id: BAD-SEVERITY
    severity: fatal
    selector: $.x
    assertion: exists
  - id: BAD-ASSERTION
    selector: $.x
    assertion: "startswith:x"
"#;
        let set = RuleSet::parse(text, "rules.yaml").unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rejected.len(), 4);
        let ids: Vec<Option<&str>> = set.rejected.iter().map(|r| r.id.as_deref()).collect();
        assert!(ids.contains(&Some("BAD-SELECTOR")));
        assert!(ids.contains(&None));
        assert!(ids.contains(&Some("BAD-SEVERITY")));
        assert!(ids.contains(&Some("BAD-ASSERTION")));
    }

    #[test]
    fn missing_rules_key_is_empty() {
        assert!(RuleSet::parse("version: 1\n", "r.yaml").unwrap().is_empty());
        assert!(RuleSet::parse("", "r.yaml").unwrap().is_empty());
    }

    #[test]
    fn malformed_files_are_errors() {
        assert!(matches!(RuleSet::parse("rules: 5\n", "r"), Err(PolicyError::Parse { .. })));
        assert!(matches!(RuleSet::parse("- a\n- b\n", "r"), Err(PolicyError::Parse { .. })));
        assert!(matches!(RuleSet::parse("rules: [\n", "r"), Err(PolicyError::Parse { .. })));
    }

    #[test]
    fn message_placeholders() {
        let rule = PolicyRule::new(
            "R",
            None,
            "$.materials[*].name",
            "exists",
            Some("{selector} {assertion}: {count} found".to_string()),
        )
        .unwrap();
        assert_eq!(rule.render_message(0), "$.materials[*].name exists: 0 found");
    }
}
