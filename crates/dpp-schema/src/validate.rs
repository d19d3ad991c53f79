//! # Schema Validation
//!
//! A schema companion is compiled into a [`CompiledSchema`], which then
//! validates any number of payload instances.
//!
//! ## Schema Resolution
//!
//! The companion's directory is the search root for external `$ref`s. A
//! reference URI is mapped to a local file by:
//!
//! 1. its path, when the scheme is `file`
//! 2. its path relative to the search root
//! 3. its last path segment in the search root
//!
//! A reference that maps to no readable file is a build error. Internal
//! `#/$defs/...` references are handled by the `jsonschema` crate.

use std::fmt;
use std::path::{Path, PathBuf};

use dpp_core::{decode_json, decode_text, Artifact, ContentDigest};
use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Error during schema loading or compilation.
///
/// A payload that violates a schema is not an error; see [`Violation`].
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// The schema companion could not be decoded or parsed.
    #[error("schema load error for '{uri}': {reason}")]
    SchemaLoad { uri: String, reason: String },

    /// The schema parsed but does not compile (invalid keyword value,
    /// unresolvable `$ref`).
    #[error("validator build error for schema '{uri}': {reason}")]
    ValidatorBuild { uri: String, reason: String },

    /// The payload could not be decoded as JSON.
    #[error("document load error for '{uri}': {reason}")]
    DocumentLoad { uri: String, reason: String },
}

/// A single violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value in the instance.
    pub instance_path: String,
    /// JSON Pointer to the keyword in the schema that failed.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Resolves external `$ref`s to files next to the referring schema.
struct LocalSchemaRetriever {
    base_dir: Option<PathBuf>,
}

impl LocalSchemaRetriever {
    fn candidates(&self, uri: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        let Ok(url) = Url::parse(uri) else {
            return candidates;
        };
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                candidates.push(path);
            }
        }
        if let Some(base) = &self.base_dir {
            let relative = url.path().trim_start_matches('/');
            if !relative.is_empty() {
                candidates.push(base.join(relative));
            }
            if let Some(name) = url.path_segments().and_then(|mut s| s.next_back()) {
                if !name.is_empty() {
                    candidates.push(base.join(name));
                }
            }
        }
        candidates
    }
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        for path in self.candidates(uri_str) {
            if !path.is_file() {
                continue;
            }
            let bytes = std::fs::read(&path)?;
            tracing::debug!(uri = uri_str, path = %path.display(), "resolved $ref locally");
            return Ok(parse_schema_bytes(&bytes, &path.display().to_string())?);
        }
        Err(format!("cannot resolve {uri_str} to a local schema file").into())
    }
}

/// A compiled schema companion.
#[derive(Debug)]
pub struct CompiledSchema {
    uri: String,
    digest: ContentDigest,
    validator: Validator,
}

impl CompiledSchema {
    /// Parse and compile a schema artifact.
    pub fn from_artifact(schema: &Artifact) -> Result<Self, SchemaValidationError> {
        let value = load_schema_document(schema)?;
        let retriever = LocalSchemaRetriever {
            base_dir: base_dir_of(schema.uri()),
        };
        let mut opts = jsonschema::options();
        if value.get("$schema").is_none() {
            opts.with_draft(jsonschema::Draft::Draft202012);
        }
        opts.with_retriever(retriever);
        let validator = opts
            .build(&value)
            .map_err(|e| SchemaValidationError::ValidatorBuild {
                uri: schema.uri().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            uri: schema.uri().to_string(),
            digest: schema.digest(),
            validator,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    /// Every violation of `instance`, in the validator's order.
    pub fn validate(&self, instance: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }

    /// Decode a payload artifact and validate it.
    pub fn validate_artifact(&self, payload: &Artifact) -> Result<Vec<Violation>, SchemaValidationError> {
        let instance = decode_json(payload.bytes()).map_err(|e| SchemaValidationError::DocumentLoad {
            uri: payload.uri().to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.validate(&instance))
    }
}

/// Parse a schema companion. YAML is accepted when the content type or
/// URI says so; everything else is read as JSON.
pub fn load_schema_document(schema: &Artifact) -> Result<Value, SchemaValidationError> {
    let is_yaml = schema.content_type().is_some_and(|ct| ct.contains("yaml"))
        || is_yaml_path(schema.uri());
    let label = schema.uri();
    if is_yaml {
        parse_yaml_schema(schema.bytes(), label)
    } else {
        decode_json(schema.bytes()).map_err(|e| SchemaValidationError::SchemaLoad {
            uri: label.to_string(),
            reason: format!("invalid JSON: {e}"),
        })
    }
}

fn parse_schema_bytes(bytes: &[u8], label: &str) -> Result<Value, SchemaValidationError> {
    if is_yaml_path(label) {
        parse_yaml_schema(bytes, label)
    } else {
        decode_json(bytes).map_err(|e| SchemaValidationError::SchemaLoad {
            uri: label.to_string(),
            reason: format!("invalid JSON: {e}"),
        })
    }
}

fn parse_yaml_schema(bytes: &[u8], label: &str) -> Result<Value, SchemaValidationError> {
    let load_error = |reason: String| SchemaValidationError::SchemaLoad {
        uri: label.to_string(),
        reason,
    };
    let text = decode_text(bytes).map_err(|e| load_error(e.to_string()))?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|e| load_error(format!("invalid YAML: {e}")))?;
    yaml_to_json_value(&yaml).map_err(|e| load_error(format!("YAML-to-JSON conversion failed: {e}")))
}

fn is_yaml_path(uri: &str) -> bool {
    let lower = uri.to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}

fn base_dir_of(uri: &str) -> Option<PathBuf> {
    let path = match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url.to_file_path().ok()?,
        Ok(_) => return None,
        Err(_) => PathBuf::from(uri),
    };
    path.parent().map(Path::to_path_buf)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped and scalar keys are stringified.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpp_core::ArtifactKind;
    use serde_json::json;

    const PASSPORT_SCHEMA: &str = r#"{
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["id", "name", "manufacturer"],
        "properties": {
            "id": {"type": "string"},
            "name": {"type": "string", "minLength": 1}
        }
    }"#;

    fn schema_artifact(uri: &str, body: &str) -> Artifact {
        Artifact::new(uri, None, ArtifactKind::JsonSchema, body.as_bytes().to_vec())
    }

    fn payload(body: &Value) -> Artifact {
        Artifact::new(
            "p.json",
            Some("application/json".into()),
            ArtifactKind::PayloadDocument,
            body.to_string().into_bytes(),
        )
    }

    #[test]
    fn missing_required_field_is_one_violation() {
        let schema = CompiledSchema::from_artifact(&schema_artifact("s.json", PASSPORT_SCHEMA)).unwrap();
        let violations = schema
            .validate_artifact(&payload(&json!({"id": "example-1", "name": "Example"})))
            .unwrap();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("manufacturer"));
        assert!(violations[0].schema_path.contains("required"));
        assert_eq!(violations[0].instance_path, "");
    }

    #[test]
    fn one_violation_per_failing_keyword() {
        let schema = CompiledSchema::from_artifact(&schema_artifact("s.json", PASSPORT_SCHEMA)).unwrap();
        let violations = schema.validate(&json!({"id": 7, "name": "", "manufacturer": "ACME"}));
        assert_eq!(violations.len(), 2);
        let paths: Vec<&str> = violations.iter().map(|v| v.instance_path.as_str()).collect();
        assert!(paths.contains(&"/id"));
        assert!(paths.contains(&"/name"));
    }

    #[test]
    fn conforming_payload_has_no_violations() {
        let schema = CompiledSchema::from_artifact(&schema_artifact("s.json", PASSPORT_SCHEMA)).unwrap();
        assert!(schema
            .validate(&json!({"id": "x", "name": "y", "manufacturer": "z"}))
            .is_empty());
    }

    #[test]
    fn yaml_schema_is_accepted() {
        let yaml = "type: object\nrequired: [id]\n";
        let schema = CompiledSchema::from_artifact(&schema_artifact("s.schema.yaml", yaml)).unwrap();
        assert_eq!(schema.validate(&json!({})).len(), 1);
    }

    #[test]
    fn relative_ref_resolves_next_to_schema() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("defs.json"),
            r#"{"$defs": {"gtin": {"type": "string", "pattern": "^[0-9]{14}$"}}}"#,
        )
        .unwrap();
        let main = dir.path().join("main.json");
        let body = r#"{"type": "object", "properties": {"gtin": {"$ref": "defs.json#/$defs/gtin"}}}"#;
        std::fs::write(&main, body).unwrap();
        let schema =
            CompiledSchema::from_artifact(&schema_artifact(main.to_str().unwrap(), body)).unwrap();
        assert!(schema.validate(&json!({"gtin": "09506000134352"})).is_empty());
        assert_eq!(schema.validate(&json!({"gtin": "123"})).len(), 1);
    }

    #[test]
    fn unresolvable_ref_fails_to_build() {
        let body = r#"{"$ref": "https://schemas.example.org/missing.json"}"#;
        let err = CompiledSchema::from_artifact(&schema_artifact("/nonexistent/s.json", body)).unwrap_err();
        assert!(matches!(err, SchemaValidationError::ValidatorBuild { .. }));
    }

    #[test]
    fn invalid_schema_document() {
        let err = CompiledSchema::from_artifact(&schema_artifact("s.json", "{not json")).unwrap_err();
        assert!(matches!(err, SchemaValidationError::SchemaLoad { .. }));
        let err = CompiledSchema::from_artifact(&schema_artifact("s.json", r#"{"type": 12}"#)).unwrap_err();
        assert!(matches!(err, SchemaValidationError::ValidatorBuild { .. }));
    }

    #[test]
    fn undecodable_payload_is_document_error() {
        let schema = CompiledSchema::from_artifact(&schema_artifact("s.json", "{}")).unwrap();
        let bad = Artifact::new("p.json", None, ArtifactKind::PayloadDocument, b"{oops".to_vec());
        assert!(matches!(
            schema.validate_artifact(&bad),
            Err(SchemaValidationError::DocumentLoad { .. })
        ));
    }

    #[test]
    fn yaml_to_json_conversion() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("a: 1\nb: [true, x]\n2: null\n").unwrap();
        let json = yaml_to_json_value(&yaml).unwrap();
        assert_eq!(json, json!({"a": 1, "b": [true, "x"], "2": null}));
    }

    #[test]
    fn violation_display() {
        let v = Violation {
            instance_path: String::new(),
            schema_path: "/required".into(),
            message: "\"x\" is a required property".into(),
        };
        assert!(v.to_string().starts_with("(root):"));
    }
}
