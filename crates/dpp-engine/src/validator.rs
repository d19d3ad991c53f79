//! # Validator Plug-ins
//!
//! A [`Validator`] checks one payload artifact against one companion
//! artifact and returns findings. The [`ValidatorRegistry`] maps each
//! companion kind to the validator the orchestrator uses for it:
//!
//! | Companion kind | Default validator |
//! |----------------|-------------------|
//! | `json_schema` | [`JsonSchemaValidator`] |
//! | `shacl_shapes` | [`ShaclValidator`] |
//! | `openapi_doc` | [`ContractStub`] |
//!
//! An `Err` (or a panic) from a validator is the orchestrator's business:
//! it becomes an error finding for that pair and the fan-out continues.

use std::collections::BTreeMap;
use std::sync::Arc;

use dpp_core::{rules, Artifact, ArtifactKind, Finding, Severity};
use dpp_rdf::{to_rdf_graph, ContextSet, ShaclSeverity, ShapesGraph};
use dpp_schema::CompiledSchema;
use serde_json::Value;

/// Error type validators report internal failures with.
pub type ValidatorError = Box<dyn std::error::Error + Send + Sync>;

/// Results kept in a shape-validation finding's evidence.
pub const MAX_EVIDENCE_RESULTS: usize = 20;

/// Run-wide inputs a validator may need beyond the pair itself.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// Local JSON-LD contexts declared by the profile.
    pub contexts: &'a ContextSet,
}

/// A pluggable check of one payload against one companion.
pub trait Validator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn validate(
        &self,
        payload: &Artifact,
        companion: &Artifact,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<Finding>, ValidatorError>;
}

/// Validators keyed by companion kind.
#[derive(Clone)]
pub struct ValidatorRegistry {
    validators: BTreeMap<ArtifactKind, Arc<dyn Validator>>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            validators: BTreeMap::new(),
        };
        registry.register(ArtifactKind::JsonSchema, Arc::new(JsonSchemaValidator));
        registry.register(ArtifactKind::ShaclShapes, Arc::new(ShaclValidator));
        registry.register(ArtifactKind::OpenApiDocument, Arc::new(ContractStub));
        registry
    }
}

impl ValidatorRegistry {
    /// Install `validator` for `companion_kind`, replacing any previous one.
    pub fn register(&mut self, companion_kind: ArtifactKind, validator: Arc<dyn Validator>) {
        self.validators.insert(companion_kind, validator);
    }

    pub fn get(&self, companion_kind: ArtifactKind) -> Option<&Arc<dyn Validator>> {
        self.validators.get(&companion_kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.validators.keys().copied()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.validators.iter().map(|(k, v)| (k, v.name())))
            .finish()
    }
}

/// JSON Schema validation: one `schema-validation` error per violation.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl Validator for JsonSchemaValidator {
    fn name(&self) -> &'static str {
        "json-schema"
    }

    fn validate(
        &self,
        payload: &Artifact,
        schema: &Artifact,
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<Finding>, ValidatorError> {
        let compiled = CompiledSchema::from_artifact(schema)?;
        let violations = compiled.validate_artifact(payload)?;
        Ok(violations
            .into_iter()
            .map(|v| {
                let location = if v.instance_path.is_empty() {
                    "$".to_string()
                } else {
                    v.instance_path.clone()
                };
                Finding::error(
                    rules::SCHEMA_VALIDATION,
                    format!("JSON Schema validation error: {}", v.message),
                )
                .with_evidence("location", location)
                .with_evidence("schema_location", v.schema_path)
                .with_evidence("artifact_hash", payload.sha256())
                .with_evidence("schema_hash", schema.sha256())
            })
            .collect())
    }
}

/// SHACL validation: one `shape-validation` finding per non-conforming pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShaclValidator;

impl Validator for ShaclValidator {
    fn name(&self) -> &'static str {
        "shacl"
    }

    fn validate(
        &self,
        payload: &Artifact,
        shapes: &Artifact,
        ctx: &ValidationContext<'_>,
    ) -> Result<Vec<Finding>, ValidatorError> {
        let shapes_graph = ShapesGraph::from_artifact(shapes)?;
        let data = to_rdf_graph(payload, ctx.contexts)?;
        let report = shapes_graph.validate(&data);
        tracing::debug!(
            payload = payload.uri(),
            shapes = shapes_graph.shape_count(),
            results = report.results.len(),
            "shacl validation complete"
        );
        let Some(max) = report.max_severity().filter(|_| !report.conforms) else {
            return Ok(Vec::new());
        };

        let results: Vec<Value> = report
            .results
            .iter()
            .take(MAX_EVIDENCE_RESULTS)
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;
        let first = report
            .results
            .first()
            .map(|r| format!(": {}", r.message))
            .unwrap_or_default();
        let finding = Finding::new(
            rules::SHAPE_VALIDATION,
            severity_for(max),
            format!(
                "SHACL validation failed with {} result(s){first}",
                report.results.len()
            ),
        )
        .with_evidence("artifact_hash", payload.sha256())
        .with_evidence("shapes_hash", shapes.sha256())
        .with_evidence("result_count", report.results.len())
        .with_evidence("results", results);
        Ok(vec![finding])
    }
}

/// Map `sh:severity` onto the report scale.
pub fn severity_for(severity: ShaclSeverity) -> Severity {
    match severity {
        ShaclSeverity::Violation => Severity::Error,
        ShaclSeverity::Warning => Severity::Warning,
        ShaclSeverity::Info => Severity::Info,
    }
}

/// API contract validation is not implemented. Every pair yields one
/// warning so that profiles declaring contract companions see it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractStub;

impl Validator for ContractStub {
    fn name(&self) -> &'static str {
        "contract-stub"
    }

    fn validate(
        &self,
        payload: &Artifact,
        contract: &Artifact,
        _ctx: &ValidationContext<'_>,
    ) -> Result<Vec<Finding>, ValidatorError> {
        Ok(vec![Finding::warning(
            rules::CONTRACT_VALIDATION_NOT_IMPLEMENTED,
            "API contract validation is not implemented",
        )
        .with_evidence("contract_hash", contract.sha256())
        .with_evidence("artifact_hash", payload.sha256())])
    }
}
