//! # Conformance Engine
//!
//! Drives one run through a fixed sequence of stages:
//!
//! ```text
//! LOAD_PROFILE -> CLASSIFY -> INGEST -> EXPAND_ARCHIVES -> PERSIST+RECORD
//!   -> AAS_CHECKS -> SCHEMA -> CONTRACT -> SHAPES (+AAS projection)
//!   -> POLICY -> TRUST -> FINALIZE
//! ```
//!
//! Profile loading and ingestion of the initial target are the only stages
//! whose failure is returned to the caller. From archive expansion on, every
//! stage operates on the accumulated artifact set and turns its failures
//! into findings. Companion-by-payload pairs are evaluated exhaustively and
//! each pair runs behind [`isolate()`]: an `Err` or a panic from one
//! validator becomes an error finding and the fan-out moves on.
//!
//! The engine keeps no state between runs. Network clients are built per
//! run unless a [`Fetcher`] is injected.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dpp_core::{
    classify, rules, Artifact, ArtifactKind, ArtifactRecord, ClassifiedInput, ConformanceReport,
    Finding, InputKind,
};
use dpp_ingest::{ingest, read_file, ArtifactStore, Fetcher, HttpFetcher, IngestError};
use dpp_policy::{PolicyEngine, PolicySubject, RuleSet};
use dpp_profile::{Profile, ProfileLoader};
use dpp_rdf::{project_aas, AasEnvironment, ContextSet};
use dpp_vc::KeyResolver;

use crate::config::EngineConfig;
use crate::error::FatalError;
use crate::trust;
use crate::validator::{ValidationContext, Validator, ValidatorError, ValidatorRegistry};

/// The conformance orchestrator.
pub struct Engine {
    config: EngineConfig,
    fetcher: Option<Arc<dyn Fetcher>>,
    validators: ValidatorRegistry,
    key_resolver: Option<Arc<dyn KeyResolver>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("custom_fetcher", &self.fetcher.is_some())
            .field("validators", &self.validators)
            .field("key_resolver", &self.key_resolver.is_some())
            .finish()
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            fetcher: None,
            validators: ValidatorRegistry::default(),
            key_resolver: None,
        }
    }

    /// Use `fetcher` for URL and structured-identifier targets instead of
    /// a fresh [`HttpFetcher`].
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the validator used for `companion_kind`.
    pub fn with_validator(mut self, companion_kind: ArtifactKind, validator: Arc<dyn Validator>) -> Self {
        self.validators.register(companion_kind, validator);
        self
    }

    /// Verify credential proofs with `resolver`. Without one, credentials
    /// are reported as unverified.
    pub fn with_key_resolver(mut self, resolver: Arc<dyn KeyResolver>) -> Self {
        self.key_resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run a full conformance check of `target` against `profile_ref`,
    /// persisting artifacts under `artifacts_dir`.
    pub fn run(
        &self,
        target: &str,
        profile_ref: &str,
        artifacts_dir: &Path,
    ) -> Result<ConformanceReport, FatalError> {
        let profile = {
            let _span = tracing::info_span!("stage", stage = "load_profile").entered();
            ProfileLoader::new(self.config.profiles_dir.clone()).load(profile_ref)?
        };
        let mut report = ConformanceReport::new(target, &profile.id, &profile.version);

        let input = classify(target);
        tracing::info!(reference = %input.canonical, kind = %input.kind, "classified input");

        let initial = {
            let _span = tracing::info_span!("stage", stage = "ingest").entered();
            self.ingest(&input)?
        };
        report.add_finding(
            Finding::info(rules::RESOLVE_INPUT, format!("Resolved input to {}", input.canonical))
                .with_evidence("kind", input.kind.as_str())
                .with_evidence("artifact_hash", initial.sha256()),
        );

        Ok(self.evaluate(report, &profile, vec![initial], artifacts_dir))
    }

    /// Check already-ingested artifacts against a loaded profile.
    ///
    /// Everything [`run()`](Self::run) does after ingestion. Never fails:
    /// problems are findings in the returned, finalized report.
    pub fn check_artifacts(
        &self,
        target: &str,
        profile: &Profile,
        artifacts: Vec<Artifact>,
        artifacts_dir: &Path,
    ) -> ConformanceReport {
        let report = ConformanceReport::new(target, &profile.id, &profile.version);
        self.evaluate(report, profile, artifacts, artifacts_dir)
    }

    fn ingest(&self, input: &ClassifiedInput) -> Result<Artifact, FatalError> {
        if input.kind == InputKind::Did {
            return Err(FatalError::Unresolvable {
                kind: input.kind,
                target: input.canonical.clone(),
            });
        }
        let artifact = match &self.fetcher {
            Some(fetcher) => ingest(input, fetcher.as_ref()),
            None => {
                let fetcher = HttpFetcher::new(self.config.fetch.clone())?;
                ingest(input, &fetcher)
            }
        }?;
        tracing::info!(
            uri = artifact.uri(),
            kind = %artifact.kind(),
            sha256 = %artifact.digest(),
            bytes = artifact.len(),
            "ingested target"
        );
        Ok(artifact)
    }

    fn evaluate(
        &self,
        report: ConformanceReport,
        profile: &Profile,
        artifacts: Vec<Artifact>,
        artifacts_dir: &Path,
    ) -> ConformanceReport {
        let mut run = Run {
            engine: self,
            profile,
            store: ArtifactStore::new(artifacts_dir),
            report,
            artifacts,
            contexts: ContextSet::new(),
        };
        run.stage("expand_archives", Run::expand_archives);
        run.stage("persist", Run::persist_all);
        run.stage("aas_checks", Run::aas_checks);
        run.stage("schema", Run::schema_validation);
        run.stage("contract", Run::contract_validation);
        run.stage("shapes", Run::shape_validation);
        run.stage("policy", Run::policy_evaluation);
        run.stage("trust", Run::trust_checks);
        run.finish()
    }
}

/// State of one run after ingestion.
struct Run<'a> {
    engine: &'a Engine,
    profile: &'a Profile,
    store: ArtifactStore,
    report: ConformanceReport,
    artifacts: Vec<Artifact>,
    contexts: ContextSet,
}

impl<'a> Run<'a> {
    fn stage(&mut self, name: &'static str, f: fn(&mut Self)) {
        let span = tracing::info_span!("stage", stage = name);
        let _guard = span.enter();
        let before = self.report.findings().len();
        f(self);
        tracing::debug!(
            findings = self.report.findings().len() - before,
            artifacts = self.artifacts.len(),
            "stage complete"
        );
    }

    fn expand_archives(&mut self) {
        let expander = self.engine.config.archive_expander();
        let mut extracted = Vec::new();
        for package in self.artifacts.iter().filter(|a| a.kind() == ArtifactKind::AasxPackage) {
            match expander.expand(package) {
                Ok(expansion) => {
                    for failure in expansion.failures {
                        tracing::warn!(entry = %failure.uri, reason = %failure.reason, "archive entry skipped");
                        self.report.add_finding(
                            Finding::error(
                                rules::ARCHIVE_EXTRACTION_ERROR,
                                format!("Failed to extract {}: {}", failure.uri, failure.reason),
                            )
                            .with_evidence("artifact_hash", package.sha256())
                            .with_evidence("entry", failure.uri),
                        );
                    }
                    for nested in expansion.depth_limited {
                        self.report.add_finding(
                            Finding::warning(
                                rules::ARCHIVE_DEPTH_LIMIT,
                                format!(
                                    "Nested package {nested} not expanded: depth limit {} reached",
                                    expander.max_depth
                                ),
                            )
                            .with_evidence("artifact_hash", package.sha256())
                            .with_evidence("entry", nested),
                        );
                    }
                    tracing::info!(package = package.uri(), extracted = expansion.artifacts.len(), "expanded package");
                    extracted.extend(expansion.artifacts);
                }
                Err(e) => {
                    tracing::warn!(package = package.uri(), error = %e, "package expansion failed");
                    self.report.add_finding(
                        Finding::error(
                            rules::ARCHIVE_EXTRACTION_ERROR,
                            format!("Failed to expand package: {e}"),
                        )
                        .with_evidence("artifact_hash", package.sha256()),
                    );
                }
            }
        }
        self.artifacts.extend(extracted);
    }

    fn persist_all(&mut self) {
        for artifact in &self.artifacts {
            persist_and_record(&self.store, &mut self.report, artifact);
        }
    }

    fn aas_checks(&mut self) {
        for artifact in self.artifacts.iter().filter(|a| a.kind() == ArtifactKind::AasPayload) {
            if declares_non_json(artifact) {
                self.report.add_finding(
                    Finding::warning(rules::AAS_JSON_SKIPPED, "Skipping AAS JSON parse for non-JSON payload")
                        .with_evidence("artifact_hash", artifact.sha256())
                        .with_evidence("content_type", artifact.content_type()),
                );
                continue;
            }
            let finding = match AasEnvironment::parse(artifact) {
                Ok(env) => Finding::info(rules::AAS_JSON_PARSED, "AAS JSON parsed successfully")
                    .with_evidence("shells", env.shell_count())
                    .with_evidence("submodels", env.submodel_count()),
                Err(e) => Finding::error(rules::AAS_JSON_ERROR, format!("AAS JSON parsing failed: {e}")),
            };
            self.report
                .add_finding(finding.with_evidence("artifact_hash", artifact.sha256()));
        }
    }

    fn schema_validation(&mut self) {
        let profile = self.profile;
        let schemas = self.load_companions(&profile.artifacts.schemas, ArtifactKind::JsonSchema);
        let payloads = of_kind(&self.artifacts, &[ArtifactKind::PayloadDocument]);
        fan_out(
            self.engine,
            &self.contexts,
            &mut self.report,
            ArtifactKind::JsonSchema,
            &schemas,
            &payloads,
            rules::SCHEMA_VALIDATION_INTERNAL_ERROR,
        );
    }

    fn contract_validation(&mut self) {
        let profile = self.profile;
        let contracts = self.load_companions(&profile.artifacts.openapi, ArtifactKind::OpenApiDocument);
        let payloads = of_kind(&self.artifacts, &[ArtifactKind::PayloadDocument]);
        fan_out(
            self.engine,
            &self.contexts,
            &mut self.report,
            ArtifactKind::OpenApiDocument,
            &contracts,
            &payloads,
            rules::CONTRACT_VALIDATION_INTERNAL_ERROR,
        );
    }

    fn shape_validation(&mut self) {
        let profile = self.profile;
        if profile.artifacts.shapes.is_empty() {
            return;
        }
        let shapes = self.load_companions(&profile.artifacts.shapes, ArtifactKind::ShaclShapes);
        self.load_contexts();

        let mut projected = Vec::new();
        for aas in self.artifacts.iter().filter(|a| a.kind() == ArtifactKind::AasPayload) {
            if declares_non_json(aas) {
                self.report.add_finding(
                    Finding::warning(
                        rules::SHAPE_VALIDATION_SKIPPED,
                        "Skipping shape validation for non-JSON AAS payload",
                    )
                    .with_evidence("artifact_hash", aas.sha256()),
                );
                continue;
            }
            match isolate(|| project_aas(aas).map_err(ValidatorError::from)) {
                Ok(rdf) => {
                    persist_and_record(&self.store, &mut self.report, &rdf);
                    projected.push(rdf);
                }
                Err(reason) => {
                    tracing::warn!(uri = aas.uri(), %reason, "AAS projection failed");
                    self.report.add_finding(
                        Finding::error(
                            rules::RDF_PROJECTION_ERROR,
                            format!("Failed to convert AAS to RDF: {reason}"),
                        )
                        .with_evidence("artifact_hash", aas.sha256()),
                    );
                }
            }
        }

        let mut targets = of_kind(
            &self.artifacts,
            &[ArtifactKind::PayloadDocument, ArtifactKind::RdfGraph],
        );
        targets.extend(projected.iter());
        fan_out(
            self.engine,
            &self.contexts,
            &mut self.report,
            ArtifactKind::ShaclShapes,
            &shapes,
            &targets,
            rules::SHAPE_VALIDATION_INTERNAL_ERROR,
        );
        self.artifacts.extend(projected);
    }

    fn policy_evaluation(&mut self) {
        let profile = self.profile;
        for path in &profile.artifacts.rules {
            let Some(file) = self.load_companion(path, None) else {
                continue;
            };
            let rule_set = match RuleSet::from_artifact(&file) {
                Ok(rule_set) => rule_set,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "rules file rejected");
                    self.report.add_finding(
                        Finding::error(
                            rules::POLICY_RULES_LOAD_ERROR,
                            format!("Failed to load policy rules: {e}"),
                        )
                        .with_evidence("rules_file", path.display().to_string()),
                    );
                    continue;
                }
            };
            let engine = PolicyEngine::new(rule_set);
            for finding in engine.load_findings() {
                self.report.add_finding(finding);
            }

            let subject = PolicySubject::select(&self.artifacts);
            for rule in engine.rules() {
                match isolate(|| Ok(engine.evaluate_rule(rule, subject.as_ref()))) {
                    Ok(Some(finding)) => self.report.add_finding(finding),
                    Ok(None) => {}
                    Err(reason) => {
                        tracing::warn!(rule = %rule.id, %reason, "policy rule evaluation failed");
                        self.report.add_finding(
                            Finding::error(
                                rules::POLICY_EVALUATION_INTERNAL_ERROR,
                                format!("Policy rule {} could not be evaluated: {reason}", rule.id),
                            )
                            .with_evidence("rule", rule.id.clone())
                            .with_evidence("rules_file", path.display().to_string()),
                        );
                    }
                }
            }
        }
    }

    fn trust_checks(&mut self) {
        let profile = self.profile;
        let resolver = self.engine.key_resolver.as_deref();
        for credential in self
            .artifacts
            .iter()
            .filter(|a| a.kind() == ArtifactKind::CredentialToken)
        {
            match isolate(|| Ok(trust::check_credential(credential, &profile.trust, resolver))) {
                Ok(findings) => {
                    for finding in findings {
                        self.report.add_finding(finding);
                    }
                }
                Err(reason) => self.report.add_finding(
                    Finding::error(
                        rules::TRUST_CREDENTIAL_PARSE_ERROR,
                        format!("Credential check failed: {reason}"),
                    )
                    .with_evidence("artifact_hash", credential.sha256()),
                ),
            }
        }
    }

    fn finish(mut self) -> ConformanceReport {
        let _span = tracing::info_span!("stage", stage = "finalize").entered();
        let passed = self.report.finalize();
        tracing::info!(
            subject = self.report.target(),
            profile = self.report.profile_id(),
            passed,
            findings = self.report.findings().len(),
            artifacts = self.report.artifacts().len(),
            "conformance run finished"
        );
        self.report
    }

    fn load_companions(&mut self, paths: &[PathBuf], kind: ArtifactKind) -> Vec<Artifact> {
        paths
            .iter()
            .filter_map(|path| self.load_companion(path, Some(kind)))
            .collect()
    }

    /// Read one companion file, or record `companion-load-error`.
    fn load_companion(&mut self, path: &Path, kind: Option<ArtifactKind>) -> Option<Artifact> {
        match read_companion(path, kind) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "companion load failed");
                let mut finding = Finding::error(
                    rules::COMPANION_LOAD_ERROR,
                    format!("Failed to load companion artifact: {e}"),
                )
                .with_evidence("path", path.display().to_string());
                if let Some(kind) = kind {
                    finding = finding.with_evidence("kind", kind.as_str());
                }
                self.report.add_finding(finding);
                None
            }
        }
    }

    fn load_contexts(&mut self) {
        let profile = self.profile;
        let contexts = self.load_companions(&profile.artifacts.contexts, ArtifactKind::JsonLdContext);
        for context in &contexts {
            if let Err(e) = self.contexts.insert_artifact(context) {
                self.report.add_finding(
                    Finding::error(
                        rules::COMPANION_LOAD_ERROR,
                        format!("Failed to load JSON-LD context: {e}"),
                    )
                    .with_evidence("path", context.uri())
                    .with_evidence("kind", ArtifactKind::JsonLdContext.as_str()),
                );
            }
        }
    }
}

/// Evaluate every (companion, payload) pair with the registered validator.
fn fan_out(
    engine: &Engine,
    contexts: &ContextSet,
    report: &mut ConformanceReport,
    companion_kind: ArtifactKind,
    companions: &[Artifact],
    payloads: &[&Artifact],
    internal_rule: &'static str,
) {
    let Some(validator) = engine.validators.get(companion_kind) else {
        tracing::warn!(kind = %companion_kind, "no validator registered");
        return;
    };
    let ctx = ValidationContext { contexts };
    for companion in companions {
        for payload in payloads {
            match isolate(|| validator.validate(payload, companion, &ctx)) {
                Ok(findings) => {
                    tracing::debug!(
                        validator = validator.name(),
                        payload = payload.uri(),
                        companion = companion.uri(),
                        findings = findings.len(),
                        "pair evaluated"
                    );
                    for finding in findings {
                        report.add_finding(finding);
                    }
                }
                Err(reason) => {
                    tracing::warn!(
                        validator = validator.name(),
                        payload = payload.uri(),
                        companion = companion.uri(),
                        %reason,
                        "validator failed"
                    );
                    report.add_finding(
                        Finding::error(internal_rule, format!("Failed to run {} validation: {reason}", validator.name()))
                            .with_evidence("artifact_hash", payload.sha256())
                            .with_evidence("companion_hash", companion.sha256())
                            .with_evidence("companion", companion.uri()),
                    );
                }
            }
        }
    }
}

/// Run `f`, turning both an `Err` and a panic into an error message.
pub fn isolate<T>(f: impl FnOnce() -> Result<T, ValidatorError>) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Persist `artifact` and append its record, with `stored_path` on success.
fn persist_and_record(store: &ArtifactStore, report: &mut ConformanceReport, artifact: &Artifact) {
    let record = ArtifactRecord::from(artifact);
    match store.persist(artifact) {
        Ok(path) => {
            report.add_artifact(record.with_metadata("stored_path", path.display().to_string()));
        }
        Err(e) => {
            tracing::warn!(uri = artifact.uri(), error = %e, "artifact persistence failed");
            report.add_finding(
                Finding::error(rules::ARTIFACT_PERSIST_ERROR, format!("Failed to persist artifact: {e}"))
                    .with_evidence("artifact_hash", artifact.sha256())
                    .with_evidence("path", e.path.display().to_string()),
            );
            report.add_artifact(record);
        }
    }
}

fn read_companion(path: &Path, kind: Option<ArtifactKind>) -> Result<Artifact, IngestError> {
    let file = read_file(path)?;
    Ok(match kind {
        Some(kind) if kind != file.kind() => Artifact::new(
            file.uri(),
            file.content_type().map(str::to_string),
            kind,
            file.bytes().to_vec(),
        ),
        _ => file,
    })
}

fn of_kind<'x>(artifacts: &'x [Artifact], kinds: &[ArtifactKind]) -> Vec<&'x Artifact> {
    artifacts.iter().filter(|a| kinds.contains(&a.kind())).collect()
}

/// A declared content type that is not JSON. An absent one is not.
fn declares_non_json(artifact: &Artifact) -> bool {
    artifact.content_type().is_some() && !artifact.is_json()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn isolate_reports_panic_messages(msg in "[a-zA-Z0-9 ._-]{0,40}") {
            let err = isolate::<()>(|| panic!("{}", msg)).unwrap_err();
            prop_assert_eq!(err, format!("panicked: {msg}"));
        }

        #[test]
        fn isolate_reports_error_messages(msg in "[a-zA-Z0-9 ._-]{0,40}") {
            let err = isolate::<u8>(|| Err(msg.clone().into())).unwrap_err();
            prop_assert_eq!(err, msg);
        }
    }
}
