//! # dpp-rdf: Normalization Layer
//!
//! Turns artifacts into validatable forms:
//!
//! - [`to_rdf_graph()`]: an RDF graph from an RDF document or a JSON-LD payload
//! - [`expand_jsonld()`]: the expanded JSON-LD form of a payload or context
//! - [`aas_to_rdf()`] / [`project_aas()`]: the partial AAS projection
//! - [`ShapesGraph`]: SHACL Core subset validation over an [`RdfGraph`]
//!
//! Every failure is an [`RdfError`]; none is fatal to a conformance run.

pub mod aas;
pub mod error;
pub mod graph;
pub mod jsonld;
pub mod shacl;
pub mod vocab;

pub use aas::{aas_to_rdf, project_aas, AasEnvironment, Identifiable};
pub use error::RdfError;
pub use graph::{Literal, Node, RdfGraph, RdfSyntax, Triple};
pub use jsonld::{expand_jsonld, ContextSet};
pub use shacl::{ShaclReport, ShaclSeverity, ShapesGraph, ValidationResult};

use std::path::Path;

use dpp_core::{decode_text, Artifact, ArtifactKind};
use url::Url;

/// Parse an artifact into an RDF graph.
///
/// RDF documents and shapes are parsed in the syntax named by their content
/// type or URI suffix, defaulting to Turtle. Payload documents and contexts
/// are read as JSON-LD, with remote contexts resolved through `contexts`.
pub fn to_rdf_graph(artifact: &Artifact, contexts: &ContextSet) -> Result<RdfGraph, RdfError> {
    let uri = artifact.uri();
    match artifact.kind() {
        ArtifactKind::PayloadDocument | ArtifactKind::JsonLdContext => {
            let text = jsonld::prepared_document(artifact, contexts)?;
            RdfGraph::parse(&text, RdfSyntax::JsonLd, None, uri)
        }
        ArtifactKind::RdfGraph | ArtifactKind::ShaclShapes => {
            let syntax = RdfSyntax::detect(artifact.content_type(), uri).unwrap_or(RdfSyntax::Turtle);
            if syntax == RdfSyntax::JsonLd {
                let text = jsonld::prepared_document(artifact, contexts)?;
                return RdfGraph::parse(&text, syntax, None, uri);
            }
            let text = decode_text(artifact.bytes())?;
            let base = base_iri(uri);
            let graph = RdfGraph::parse(&text, syntax, base.as_deref(), uri)?;
            tracing::debug!(uri, %syntax, triples = graph.len(), "parsed RDF document");
            Ok(graph)
        }
        kind => Err(RdfError::TypeMismatch {
            uri: uri.to_string(),
            kind,
            operation: "RDF conversion",
        }),
    }
}

/// Base IRI for relative references in a document at `uri`.
fn base_iri(uri: &str) -> Option<String> {
    let without_fragment = uri.split('#').next().unwrap_or(uri);
    match Url::parse(without_fragment) {
        Ok(url) if !url.cannot_be_a_base() => Some(url.to_string()),
        _ => Url::from_file_path(Path::new(without_fragment))
            .ok()
            .map(|u| u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turtle_artifact_uses_declared_syntax() {
        let a = Artifact::new(
            "https://example.org/g.ttl",
            Some("text/turtle".into()),
            ArtifactKind::RdfGraph,
            b"<#a> <https://e.org/p> \"x\" .".to_vec(),
        );
        let g = to_rdf_graph(&a, &ContextSet::new()).unwrap();
        assert_eq!(g.triples()[0].subject, Node::iri("https://example.org/g.ttl#a"));
    }

    #[test]
    fn ntriples_by_suffix() {
        let a = Artifact::new(
            "/data/g.nt",
            None,
            ArtifactKind::RdfGraph,
            b"<https://e.org/s> <https://e.org/p> <https://e.org/o> .\n".to_vec(),
        );
        assert_eq!(to_rdf_graph(&a, &ContextSet::new()).unwrap().len(), 1);
    }

    #[test]
    fn payload_is_read_as_jsonld() {
        let a = Artifact::new(
            "p.json",
            Some("application/json".into()),
            ArtifactKind::PayloadDocument,
            br#"{"@context": {"@vocab": "https://schema.org/"}, "@id": "https://e.org/p", "name": "x"}"#.to_vec(),
        );
        assert_eq!(to_rdf_graph(&a, &ContextSet::new()).unwrap().len(), 1);
    }

    #[test]
    fn plain_json_payload_yields_empty_graph() {
        let a = Artifact::new(
            "p.json",
            Some("application/json".into()),
            ArtifactKind::PayloadDocument,
            br#"{"id": "example-1", "name": "Example"}"#.to_vec(),
        );
        assert!(to_rdf_graph(&a, &ContextSet::new()).unwrap().is_empty());
    }

    #[test]
    fn invalid_content_is_an_error() {
        let a = Artifact::new("g.ttl", Some("text/turtle".into()), ArtifactKind::RdfGraph, b"@prefix".to_vec());
        assert!(matches!(to_rdf_graph(&a, &ContextSet::new()), Err(RdfError::Parse { .. })));
        let p = Artifact::new("p.json", None, ArtifactKind::PayloadDocument, b"{not json".to_vec());
        assert!(matches!(to_rdf_graph(&p, &ContextSet::new()), Err(RdfError::Json { .. })));
    }

    #[test]
    fn other_kinds_are_type_mismatch() {
        let a = Artifact::new("s.json", None, ArtifactKind::JsonSchema, b"{}".to_vec());
        assert!(matches!(
            to_rdf_graph(&a, &ContextSet::new()),
            Err(RdfError::TypeMismatch { kind: ArtifactKind::JsonSchema, .. })
        ));
    }

    #[test]
    fn base_iri_for_paths_and_urls() {
        assert_eq!(base_iri("https://e.org/x.ttl#rdf").as_deref(), Some("https://e.org/x.ttl"));
        assert_eq!(base_iri("/tmp/shapes.ttl").as_deref(), Some("file:///tmp/shapes.ttl"));
        assert_eq!(base_iri("relative.ttl"), None);
    }
}
