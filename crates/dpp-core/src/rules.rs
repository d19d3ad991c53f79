//! Stable rule identifiers for findings emitted by the pipeline itself.
//!
//! Policy rules carry their own ids from the rule file; everything else a
//! run can report is named here so that ids stay stable across releases.

pub const RESOLVE_INPUT: &str = "resolve-input";

pub const ARCHIVE_EXTRACTION_ERROR: &str = "archive-extraction-error";
pub const ARCHIVE_DEPTH_LIMIT: &str = "archive-depth-limit";
pub const ARTIFACT_PERSIST_ERROR: &str = "artifact-persist-error";

pub const AAS_JSON_PARSED: &str = "aas-json-parsed";
pub const AAS_JSON_SKIPPED: &str = "aas-json-skipped";
pub const AAS_JSON_ERROR: &str = "aas-json-error";

pub const COMPANION_LOAD_ERROR: &str = "companion-load-error";

pub const SCHEMA_VALIDATION: &str = "schema-validation";
pub const SCHEMA_VALIDATION_INTERNAL_ERROR: &str = "schema-validation-internal-error";

pub const CONTRACT_VALIDATION_NOT_IMPLEMENTED: &str = "contract-validation-not-implemented";
pub const CONTRACT_VALIDATION_INTERNAL_ERROR: &str = "contract-validation-internal-error";

pub const SHAPE_VALIDATION: &str = "shape-validation";
pub const SHAPE_VALIDATION_INTERNAL_ERROR: &str = "shape-validation-internal-error";
pub const SHAPE_VALIDATION_SKIPPED: &str = "shape-validation-skipped";
pub const RDF_PROJECTION_ERROR: &str = "rdf-projection-error";

pub const POLICY_RULES_LOAD_ERROR: &str = "policy-rules-load-error";
pub const POLICY_EVALUATION_INTERNAL_ERROR: &str = "policy-evaluation-internal-error";

pub const TRUST_CREDENTIAL_PARSE_ERROR: &str = "trust-credential-parse-error";
pub const TRUST_CREDENTIAL_UNSUPPORTED_FORMAT: &str = "trust-credential-unsupported-format";
pub const TRUST_CREDENTIAL_FORMAT: &str = "trust-credential-format";
pub const TRUST_CREDENTIAL_ISSUER: &str = "trust-credential-issuer";
pub const TRUST_CREDENTIAL_SIGNATURE: &str = "trust-credential-signature";
pub const TRUST_CREDENTIAL_VERIFIED: &str = "trust-credential-verified";
pub const TRUST_CREDENTIAL_UNVERIFIED: &str = "trust-credential-unverified";
