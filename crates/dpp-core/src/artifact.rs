//! # Artifact Model
//!
//! An [`Artifact`] is the unit of content flowing through a conformance run:
//! raw bytes, the declared content type, a classified [`ArtifactKind`], the
//! SHA-256 of the bytes, and a free-form metadata map.
//!
//! ## Invariants
//!
//! - The digest is computed in the constructor from the exact bytes held.
//!   There is no setter for either, so the two can never drift apart.
//! - Derived representations (an RDF projection, an archive entry) are new
//!   artifacts created through [`Artifact::derive()`], with their own digest
//!   and a `#suffix` appended to the parent URI.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::decode_json;
use crate::digest::{sha256_digest, ContentDigest};

/// Top-level keys that identify an Asset Administration Shell environment.
pub const AAS_TOP_LEVEL_KEYS: [&str; 3] =
    ["assetAdministrationShells", "submodels", "conceptDescriptions"];

/// The closed set of artifact kinds.
///
/// Serialized names are stable; downstream attestation consumers read them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A product passport payload (JSON or JSON-LD).
    #[serde(rename = "dpp_payload")]
    PayloadDocument,
    /// An Asset Administration Shell environment (JSON or XML).
    #[serde(rename = "aas_payload")]
    AasPayload,
    /// A verifiable credential, either a compact JWS or a JSON document with a proof.
    #[serde(rename = "vc_jwt")]
    CredentialToken,
    #[serde(rename = "json_schema")]
    JsonSchema,
    #[serde(rename = "openapi_doc")]
    OpenApiDocument,
    #[serde(rename = "jsonld_context")]
    JsonLdContext,
    #[serde(rename = "rdf_graph")]
    RdfGraph,
    #[serde(rename = "shacl_shapes")]
    ShaclShapes,
    /// An AASX package (OPC zip container).
    #[serde(rename = "aasx_package")]
    AasxPackage,
}

/// The content grammar an artifact kind is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentGrammar {
    Json,
    JsonOrXml,
    JsonOrYaml,
    CredentialToken,
    Rdf,
    ZipPackage,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 9] = [
        ArtifactKind::PayloadDocument,
        ArtifactKind::AasPayload,
        ArtifactKind::CredentialToken,
        ArtifactKind::JsonSchema,
        ArtifactKind::OpenApiDocument,
        ArtifactKind::JsonLdContext,
        ArtifactKind::RdfGraph,
        ArtifactKind::ShaclShapes,
        ArtifactKind::AasxPackage,
    ];

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PayloadDocument => "dpp_payload",
            Self::AasPayload => "aas_payload",
            Self::CredentialToken => "vc_jwt",
            Self::JsonSchema => "json_schema",
            Self::OpenApiDocument => "openapi_doc",
            Self::JsonLdContext => "jsonld_context",
            Self::RdfGraph => "rdf_graph",
            Self::ShaclShapes => "shacl_shapes",
            Self::AasxPackage => "aasx_package",
        }
    }

    /// Total mapping from kind to the grammar its bytes must follow.
    pub fn grammar(&self) -> ContentGrammar {
        match self {
            Self::PayloadDocument | Self::JsonLdContext => ContentGrammar::Json,
            Self::JsonSchema | Self::OpenApiDocument => ContentGrammar::JsonOrYaml,
            Self::AasPayload => ContentGrammar::JsonOrXml,
            Self::CredentialToken => ContentGrammar::CredentialToken,
            Self::RdfGraph | Self::ShaclShapes => ContentGrammar::Rdf,
            Self::AasxPackage => ContentGrammar::ZipPackage,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, hashed, typed unit of content.
#[derive(Debug, Clone)]
pub struct Artifact {
    uri: String,
    content_type: Option<String>,
    kind: ArtifactKind,
    bytes: Arc<[u8]>,
    digest: ContentDigest,
    metadata: BTreeMap<String, Value>,
}

impl Artifact {
    /// Construct an artifact, hashing `bytes`.
    pub fn new(
        uri: impl Into<String>,
        content_type: Option<String>,
        kind: ArtifactKind,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes: Arc<[u8]> = Arc::from(bytes.into());
        let digest = sha256_digest(&bytes);
        Self {
            uri: uri.into(),
            content_type,
            kind,
            bytes,
            digest,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry. Consumes the artifact, so it only applies
    /// while the value is still being assembled by its producer.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Create a new artifact derived from this one, named `<uri>#<suffix>`.
    ///
    /// The derived artifact records the parent digest as `derived_from`.
    pub fn derive(
        &self,
        suffix: &str,
        content_type: Option<String>,
        kind: ArtifactKind,
        bytes: impl Into<Vec<u8>>,
    ) -> Artifact {
        Artifact::new(format!("{}#{}", self.uri, suffix), content_type, kind, bytes)
            .with_metadata("derived_from", self.digest.to_hex())
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn digest(&self) -> ContentDigest {
        self.digest
    }

    /// Lowercase hex SHA-256 of the content.
    pub fn sha256(&self) -> String {
        self.digest.to_hex()
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// True when the declared content type names a JSON media type.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }
}

/// Infer a kind from a JSON body.
///
/// AAS environments are recognised by their top-level collections,
/// credentials by a `type` naming `VerifiableCredential`. Everything else,
/// including bodies that fail to decode, is a payload document.
pub fn sniff_json_kind(raw: &[u8]) -> ArtifactKind {
    let Ok(Value::Object(map)) = decode_json(raw) else {
        return ArtifactKind::PayloadDocument;
    };
    if AAS_TOP_LEVEL_KEYS.iter().any(|k| map.contains_key(*k)) {
        return ArtifactKind::AasPayload;
    }
    let is_credential = match map.get("type") {
        Some(Value::String(t)) => t == "VerifiableCredential",
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str() == Some("VerifiableCredential")),
        _ => false,
    };
    if is_credential {
        ArtifactKind::CredentialToken
    } else {
        ArtifactKind::PayloadDocument
    }
}

/// True when a JSON body carries a top-level `@context`.
pub fn has_jsonld_context(raw: &[u8]) -> bool {
    matches!(decode_json(raw), Ok(Value::Object(map)) if map.contains_key("@context"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_matches_bytes() {
        let a = Artifact::new("file:///x.json", None, ArtifactKind::PayloadDocument, b"{}".to_vec());
        assert_eq!(
            a.sha256(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_derive_appends_suffix_and_parent() {
        let parent = Artifact::new(
            "https://example.org/aas.json",
            Some("application/json".into()),
            ArtifactKind::AasPayload,
            b"{\"submodels\":[]}".to_vec(),
        );
        let child = parent.derive("rdf", Some("text/turtle".into()), ArtifactKind::RdfGraph, b"".to_vec());
        assert_eq!(child.uri(), "https://example.org/aas.json#rdf");
        assert_eq!(child.kind(), ArtifactKind::RdfGraph);
        assert_ne!(child.digest(), parent.digest());
        assert_eq!(
            child.metadata().get("derived_from"),
            Some(&Value::String(parent.sha256()))
        );
    }

    #[test]
    fn test_kind_wire_names_match_serde() {
        for kind in ArtifactKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, Value::String(kind.as_str().to_string()));
        }
    }

    #[test]
    fn test_every_kind_has_a_grammar() {
        assert_eq!(ArtifactKind::AasxPackage.grammar(), ContentGrammar::ZipPackage);
        assert_eq!(ArtifactKind::ShaclShapes.grammar(), ContentGrammar::Rdf);
        assert_eq!(ArtifactKind::PayloadDocument.grammar(), ContentGrammar::Json);
    }

    #[test]
    fn test_sniff_json_kind() {
        assert_eq!(
            sniff_json_kind(br#"{"assetAdministrationShells": []}"#),
            ArtifactKind::AasPayload
        );
        assert_eq!(
            sniff_json_kind(br#"{"type": ["VerifiableCredential"], "proof": {}}"#),
            ArtifactKind::CredentialToken
        );
        assert_eq!(
            sniff_json_kind(br#"{"id": "example-1"}"#),
            ArtifactKind::PayloadDocument
        );
        assert_eq!(sniff_json_kind(b"not json"), ArtifactKind::PayloadDocument);
    }

    #[test]
    fn test_is_json() {
        let a = Artifact::new("x", Some("application/ld+json".into()), ArtifactKind::PayloadDocument, Vec::new());
        assert!(a.is_json());
        let b = Artifact::new("x", Some("application/xml".into()), ArtifactKind::AasPayload, Vec::new());
        assert!(!b.is_json());
        let c = Artifact::new("x", None, ArtifactKind::AasPayload, Vec::new());
        assert!(!c.is_json());
    }

    #[test]
    fn test_has_jsonld_context() {
        assert!(has_jsonld_context(br#"{"@context": "https://schema.org", "name": "x"}"#));
        assert!(!has_jsonld_context(br#"{"name": "x"}"#));
    }
}
