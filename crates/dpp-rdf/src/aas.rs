//! # Asset Administration Shell Environment
//!
//! A typed view of an AAS V3 JSON environment, deep enough for the domain
//! parse check and the RDF projection. Identifiable elements keep their
//! remaining members in `extra`; only the identity fields are typed.
//!
//! ## Projection
//!
//! [`aas_to_rdf`] is a partial projection: each shell and each submodel
//! becomes one subject with an `rdf:type` and an `aas:id` triple. Subject
//! IRIs are `urn:aas:shell:<id>` and `urn:aas:submodel:<id>` with the id
//! percent-encoded. Elements with a missing or empty id are skipped.

use dpp_core::{Artifact, ArtifactKind};
use serde::Deserialize;
use serde_json::{Map, Value};
use url::form_urlencoded::byte_serialize;

use crate::error::RdfError;
use crate::graph::{Literal, Node, RdfGraph, Triple};
use crate::jsonld::decode_document;
use crate::vocab::{aas, RDF_TYPE};

const SHELL_MODEL_TYPE: &str = "AssetAdministrationShell";
const SUBMODEL_MODEL_TYPE: &str = "Submodel";
const CONCEPT_DESCRIPTION_MODEL_TYPE: &str = "ConceptDescription";

/// Top-level AAS environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AasEnvironment {
    #[serde(default)]
    pub asset_administration_shells: Vec<Identifiable>,
    #[serde(default)]
    pub submodels: Vec<Identifiable>,
    #[serde(default)]
    pub concept_descriptions: Vec<Identifiable>,
}

/// An identifiable element: shell, submodel or concept description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifiable {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub id_short: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identifiable {
    /// The id, if present and non-empty.
    pub fn identifier(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

impl AasEnvironment {
    /// Parse an AAS payload. The artifact must carry JSON.
    pub fn parse(artifact: &Artifact) -> Result<Self, RdfError> {
        if artifact.kind() != ArtifactKind::AasPayload {
            return Err(RdfError::TypeMismatch {
                uri: artifact.uri().to_string(),
                kind: artifact.kind(),
                operation: "AAS environment parsing",
            });
        }
        let document = decode_document(artifact)?;
        Self::from_value(document, artifact.uri())
    }

    /// Parse an already-decoded document. `uri` labels errors.
    pub fn from_value(document: Value, uri: &str) -> Result<Self, RdfError> {
        if !document.is_object() {
            return Err(RdfError::Aas {
                uri: uri.to_string(),
                reason: "environment must be a JSON object".to_string(),
            });
        }
        let env: AasEnvironment = serde_json::from_value(document).map_err(|e| RdfError::Aas {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        env.check_model_types(uri)?;
        Ok(env)
    }

    fn check_model_types(&self, uri: &str) -> Result<(), RdfError> {
        let collections = [
            ("assetAdministrationShells", &self.asset_administration_shells, SHELL_MODEL_TYPE),
            ("submodels", &self.submodels, SUBMODEL_MODEL_TYPE),
            ("conceptDescriptions", &self.concept_descriptions, CONCEPT_DESCRIPTION_MODEL_TYPE),
        ];
        for (collection, elements, expected) in collections {
            for (index, element) in elements.iter().enumerate() {
                if let Some(actual) = element.model_type.as_deref() {
                    if actual != expected {
                        return Err(RdfError::Aas {
                            uri: uri.to_string(),
                            reason: format!(
                                "{collection}[{index}] has modelType {actual:?}, expected {expected:?}"
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn shell_count(&self) -> usize {
        self.asset_administration_shells.len()
    }

    pub fn submodel_count(&self) -> usize {
        self.submodels.len()
    }

    /// The partial RDF projection described in the module docs.
    pub fn to_graph(&self) -> RdfGraph {
        let mut graph = RdfGraph::new();
        let groups = [
            ("shell", SHELL_MODEL_TYPE, &self.asset_administration_shells),
            ("submodel", SUBMODEL_MODEL_TYPE, &self.submodels),
        ];
        for (prefix, class, elements) in groups {
            for element in elements {
                let Some(id) = element.identifier() else {
                    tracing::debug!(prefix, id_short = ?element.id_short, "skipping element without id");
                    continue;
                };
                let subject = Node::Iri(subject_iri(prefix, id));
                graph.insert(Triple::new(subject.clone(), RDF_TYPE, Node::Iri(aas(class))));
                graph.insert(Triple::new(subject, aas("id"), Node::Literal(Literal::string(id))));
            }
        }
        graph
    }
}

fn subject_iri(prefix: &str, id: &str) -> String {
    let encoded: String = byte_serialize(id.as_bytes()).collect();
    format!("urn:aas:{prefix}:{encoded}")
}

/// Project an AAS payload to RDF.
pub fn aas_to_rdf(artifact: &Artifact) -> Result<RdfGraph, RdfError> {
    Ok(AasEnvironment::parse(artifact)?.to_graph())
}

/// Project an AAS payload to a derived Turtle artifact `<uri>#rdf`.
pub fn project_aas(artifact: &Artifact) -> Result<Artifact, RdfError> {
    let turtle = aas_to_rdf(artifact)?.to_turtle()?;
    Ok(artifact.derive(
        "rdf",
        Some("text/turtle".to_string()),
        ArtifactKind::RdfGraph,
        turtle.into_bytes(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RdfSyntax;

    fn aas_artifact(body: &str) -> Artifact {
        Artifact::new(
            "file:///env.json",
            Some("application/json".into()),
            ArtifactKind::AasPayload,
            body.as_bytes().to_vec(),
        )
    }

    const ENV: &str = r#"{
        "assetAdministrationShells": [
            {"id": "https://example.com/aas/1", "idShort": "Shell1", "modelType": "AssetAdministrationShell"},
            {"idShort": "NoId"}
        ],
        "submodels": [
            {"id": "urn:sm:nameplate", "modelType": "Submodel", "submodelElements": []},
            {"id": ""}
        ]
    }"#;

    #[test]
    fn parses_environment_counts() {
        let env = AasEnvironment::parse(&aas_artifact(ENV)).unwrap();
        assert_eq!(env.shell_count(), 2);
        assert_eq!(env.submodel_count(), 2);
        assert!(env.submodels[0].extra.contains_key("submodelElements"));
    }

    #[test]
    fn projection_skips_missing_and_empty_ids() {
        let g = aas_to_rdf(&aas_artifact(ENV)).unwrap();
        assert_eq!(g.len(), 4);
        let shell = Node::iri("urn:aas:shell:https%3A%2F%2Fexample.com%2Faas%2F1");
        assert!(g.contains(&shell, RDF_TYPE, &Node::iri("https://admin-shell.io/aas/3/0/AssetAdministrationShell")));
        let submodel = Node::iri("urn:aas:submodel:urn%3Asm%3Anameplate");
        assert_eq!(
            g.object(&submodel, "https://admin-shell.io/aas/3/0/id"),
            Some(&Node::Literal(Literal::string("urn:sm:nameplate")))
        );
    }

    #[test]
    fn derived_artifact_is_turtle_and_linked() {
        let source = aas_artifact(ENV);
        let derived = project_aas(&source).unwrap();
        assert_eq!(derived.uri(), "file:///env.json#rdf");
        assert_eq!(derived.kind(), ArtifactKind::RdfGraph);
        assert_eq!(derived.content_type(), Some("text/turtle"));
        assert_eq!(derived.metadata()["derived_from"], source.sha256());
        let text = std::str::from_utf8(derived.bytes()).unwrap();
        let reparsed = RdfGraph::parse(text, RdfSyntax::Turtle, None, derived.uri()).unwrap();
        assert_eq!(reparsed, aas_to_rdf(&source).unwrap());
    }

    #[test]
    fn wrong_model_type_is_rejected() {
        let err = AasEnvironment::parse(&aas_artifact(
            r#"{"submodels": [{"id": "x", "modelType": "AssetAdministrationShell"}]}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, RdfError::Aas { .. }));
    }

    #[test]
    fn non_object_and_bad_shapes_are_rejected() {
        assert!(matches!(AasEnvironment::parse(&aas_artifact("[]")), Err(RdfError::Aas { .. })));
        assert!(matches!(
            AasEnvironment::parse(&aas_artifact(r#"{"submodels": {"id": "x"}}"#)),
            Err(RdfError::Aas { .. })
        ));
        assert!(matches!(
            AasEnvironment::parse(&aas_artifact(r#"{"submodels": [{"id": 7}]}"#)),
            Err(RdfError::Aas { .. })
        ));
        assert!(matches!(AasEnvironment::parse(&aas_artifact("{")), Err(RdfError::Json { .. })));
    }

    #[test]
    fn utf16_environment_parses() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in r#"{"submodels": [{"id": "a"}]}"#.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let a = Artifact::new("e.json", Some("application/json".into()), ArtifactKind::AasPayload, bytes);
        assert_eq!(AasEnvironment::parse(&a).unwrap().submodel_count(), 1);
    }
}
