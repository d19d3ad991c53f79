//! # JSON-LD Handling
//!
//! The JSON-LD parser runs without a network document loader. Remote
//! `@context` references are instead resolved against a [`ContextSet`] of
//! local context documents, normally the `contexts` companions of a
//! profile. A reference resolves when its full URL or its last path segment
//! matches a registered name. Unresolvable references fail with
//! [`RdfError::UnresolvedContext`].

use std::collections::BTreeMap;

use dpp_core::{decode_json, Artifact, ArtifactKind, JsonDecodeError};
use serde_json::Value;
use sophia_api::parser::QuadParser;
use sophia_api::serializer::{QuadSerializer, Stringifier};
use sophia_api::source::QuadSource;
use sophia_inmem::dataset::LightDataset;
use sophia_jsonld::{JsonLdParser, JsonLdSerializer};

use crate::error::RdfError;

/// Remote context references are followed at most this deep.
const MAX_CONTEXT_DEPTH: usize = 8;

/// Local stand-ins for remote JSON-LD contexts.
#[derive(Debug, Clone, Default)]
pub struct ContextSet {
    entries: BTreeMap<String, Value>,
}

impl ContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context under a URL or file name. A document with a
    /// top-level `@context` member is unwrapped to that member.
    pub fn insert(&mut self, name: impl Into<String>, document: Value) {
        let context = match document {
            Value::Object(mut map) if map.contains_key("@context") => {
                map.remove("@context").unwrap_or(Value::Null)
            }
            other => other,
        };
        self.entries.insert(name.into(), context);
    }

    /// Register one context artifact under its URI and file name.
    pub fn insert_artifact(&mut self, artifact: &Artifact) -> Result<(), RdfError> {
        let document = decode_document(artifact)?;
        self.insert(last_segment(artifact.uri()), document.clone());
        self.insert(artifact.uri(), document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the local context for a reference.
    pub fn lookup(&self, reference: &str) -> Option<&Value> {
        self.entries
            .get(reference)
            .or_else(|| self.entries.get(last_segment(reference)))
    }

    /// Replace every string `@context` reference in `document` with its
    /// local copy.
    pub fn inline(&self, document: &Value, uri: &str) -> Result<Value, RdfError> {
        let mut document = document.clone();
        self.inline_value(&mut document, uri)?;
        Ok(document)
    }

    fn inline_value(&self, value: &mut Value, uri: &str) -> Result<(), RdfError> {
        match value {
            Value::Object(map) => {
                for (key, v) in map.iter_mut() {
                    if key == "@context" {
                        self.inline_context(v, uri, 0)?;
                    } else {
                        self.inline_value(v, uri)?;
                    }
                }
            }
            Value::Array(items) => {
                for v in items {
                    self.inline_value(v, uri)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn inline_context(&self, context: &mut Value, uri: &str, depth: usize) -> Result<(), RdfError> {
        match context {
            Value::String(reference) => {
                let resolved = self.resolve(reference, uri, depth)?;
                *context = resolved;
            }
            Value::Array(entries) => {
                let mut flattened = Vec::with_capacity(entries.len());
                for entry in entries.drain(..) {
                    match entry {
                        Value::String(reference) => match self.resolve(&reference, uri, depth)? {
                            Value::Array(inner) => flattened.extend(inner),
                            other => flattened.push(other),
                        },
                        other => flattened.push(other),
                    }
                }
                *entries = flattened;
            }
            _ => {}
        }
        Ok(())
    }

    fn resolve(&self, reference: &str, uri: &str, depth: usize) -> Result<Value, RdfError> {
        let unresolved = || RdfError::UnresolvedContext {
            uri: uri.to_string(),
            context: reference.to_string(),
        };
        if depth >= MAX_CONTEXT_DEPTH {
            return Err(unresolved());
        }
        let mut resolved = self.lookup(reference).cloned().ok_or_else(unresolved)?;
        self.inline_context(&mut resolved, uri, depth + 1)?;
        Ok(resolved)
    }
}

fn last_segment(reference: &str) -> &str {
    let path = reference.split(['?', '#']).next().unwrap_or(reference);
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Decode a JSON-bearing artifact.
pub(crate) fn decode_document(artifact: &Artifact) -> Result<Value, RdfError> {
    decode_json(artifact.bytes()).map_err(|e| match e {
        JsonDecodeError::Decode(e) => RdfError::Decode(e),
        JsonDecodeError::Json(source) => RdfError::Json {
            uri: artifact.uri().to_string(),
            source,
        },
    })
}

/// Decode a JSON-LD document and inline its contexts, ready for parsing.
pub(crate) fn prepared_document(artifact: &Artifact, contexts: &ContextSet) -> Result<String, RdfError> {
    let document = decode_document(artifact)?;
    Ok(contexts.inline(&document, artifact.uri())?.to_string())
}

/// Expanded JSON-LD form of a payload document or context artifact.
///
/// The document is converted to RDF and serialized back, which yields the
/// expanded (context-free) node objects.
pub fn expand_jsonld(artifact: &Artifact, contexts: &ContextSet) -> Result<Value, RdfError> {
    if !matches!(
        artifact.kind(),
        ArtifactKind::PayloadDocument | ArtifactKind::JsonLdContext
    ) {
        return Err(RdfError::TypeMismatch {
            uri: artifact.uri().to_string(),
            kind: artifact.kind(),
            operation: "JSON-LD expansion",
        });
    }
    let text = prepared_document(artifact, contexts)?;
    let dataset: LightDataset = JsonLdParser::new()
        .parse_str(&text)
        .collect_quads()
        .map_err(|e| RdfError::Parse {
            uri: artifact.uri().to_string(),
            syntax: crate::RdfSyntax::JsonLd,
            reason: e.to_string(),
        })?;

    let mut serializer = JsonLdSerializer::new_stringifier();
    serializer
        .serialize_dataset(&dataset)
        .map_err(|e| RdfError::Serialize(e.to_string()))?;
    serde_json::from_str(serializer.as_str()).map_err(|e| RdfError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(body: &Value) -> Artifact {
        Artifact::new(
            "file:///p.jsonld",
            Some("application/ld+json".into()),
            ArtifactKind::PayloadDocument,
            body.to_string().into_bytes(),
        )
    }

    #[test]
    fn inline_replaces_remote_reference_by_file_name() {
        let mut set = ContextSet::new();
        set.insert("dpp.jsonld", json!({"@context": {"@vocab": "https://schema.org/"}}));
        let doc = json!({"@context": "https://example.org/contexts/dpp.jsonld", "name": "x"});
        let out = set.inline(&doc, "p").unwrap();
        assert_eq!(out["@context"], json!({"@vocab": "https://schema.org/"}));
    }

    #[test]
    fn inline_flattens_array_contexts() {
        let mut set = ContextSet::new();
        set.insert("a.jsonld", json!([{"x": "https://e.org/x"}, {"y": "https://e.org/y"}]));
        let doc = json!({"@context": ["https://e.org/a.jsonld", {"z": "https://e.org/z"}]});
        let out = set.inline(&doc, "p").unwrap();
        assert_eq!(out["@context"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn unknown_remote_context_is_an_error() {
        let doc = json!({"@context": "https://w3id.org/unknown/v1", "name": "x"});
        let err = ContextSet::new().inline(&doc, "p").unwrap_err();
        assert!(matches!(err, RdfError::UnresolvedContext { context, .. } if context.contains("unknown")));
    }

    #[test]
    fn self_referencing_context_terminates() {
        let mut set = ContextSet::new();
        set.insert("loop.jsonld", json!("https://e.org/loop.jsonld"));
        let doc = json!({"@context": "https://e.org/loop.jsonld"});
        assert!(set.inline(&doc, "p").is_err());
    }

    #[test]
    fn expansion_produces_absolute_properties() {
        let a = payload(&json!({
            "@context": {"@vocab": "https://schema.org/"},
            "@id": "https://e.org/p1",
            "name": "Widget"
        }));
        let expanded = expand_jsonld(&a, &ContextSet::new()).unwrap();
        let text = expanded.to_string();
        assert!(text.contains("https://schema.org/name"), "{text}");
        assert!(text.contains("Widget"));
        assert!(!text.contains("@vocab"));
    }

    #[test]
    fn expansion_rejects_other_kinds() {
        let a = Artifact::new("g.ttl", Some("text/turtle".into()), ArtifactKind::RdfGraph, b"".to_vec());
        let err = expand_jsonld(&a, &ContextSet::new()).unwrap_err();
        assert!(matches!(err, RdfError::TypeMismatch { kind: ArtifactKind::RdfGraph, .. }));
    }

    #[test]
    fn insert_artifact_registers_uri_and_file_name() {
        let ctx = Artifact::new(
            "/profiles/espr/contexts/dpp.jsonld",
            Some("application/ld+json".into()),
            ArtifactKind::JsonLdContext,
            br#"{"@context": {"gtin": "https://gs1.org/voc/gtin"}}"#.to_vec(),
        );
        let mut set = ContextSet::new();
        set.insert_artifact(&ctx).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.lookup("https://any.host/dpp.jsonld").is_some());
    }
}
