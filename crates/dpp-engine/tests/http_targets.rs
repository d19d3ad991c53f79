//! Runs whose target is fetched over HTTP from a local mock server.

use std::path::PathBuf;

use dpp_core::{rules, ArtifactKind, ConformanceReport};
use dpp_engine::{Engine, EngineConfig, FatalError};
use dpp_ingest::IngestError;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RULES: &str = "rules:\n  - id: has-name\n    severity: error\n    selector: $.name\n    assertion: exists\n";

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("profiles/web");
    std::fs::create_dir_all(profile.join("rules")).unwrap();
    std::fs::write(
        profile.join("profile.yaml"),
        "id: web\nversion: '1'\nartifacts:\n  rules: [rules/passport.yaml]\n",
    )
    .unwrap();
    std::fs::write(profile.join("rules/passport.yaml"), RULES).unwrap();
    dir
}

async fn run(
    dir: &TempDir,
    target: String,
    config: EngineConfig,
) -> Result<ConformanceReport, FatalError> {
    let out: PathBuf = dir.path().join("out");
    let config = config.with_profiles_dir(dir.path().join("profiles"));
    tokio::task::spawn_blocking(move || Engine::new(config).run(&target, "web", &out))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn scenario_b_http_404_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = workspace();

    let err = run(&dir, format!("{}/missing", server.uri()), EngineConfig::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, FatalError::Ingest(IngestError::HttpStatus { status: 404, .. })),
        "{err}"
    );
    assert!(!dir.path().join("out").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn fetched_payload_is_checked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/passport"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(br#"{"id": "p-1", "name": "Widget"}"#.to_vec(), "application/json"),
        )
        .mount(&server)
        .await;
    let dir = workspace();

    let report = run(&dir, format!("{}/passport", server.uri()), EngineConfig::default())
        .await
        .unwrap();
    assert_eq!(report.passed(), Some(true));
    assert_eq!(report.artifacts().len(), 1);
    assert_eq!(report.artifacts()[0].kind, ArtifactKind::PayloadDocument);
    assert_eq!(report.findings_for(rules::RESOLVE_INPUT).count(), 1);
    assert_eq!(report.findings_for("has-name").count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn scheme_less_fallback_reference_is_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/passport"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(br#"{"id": "p-2"}"#.to_vec(), "application/json"),
        )
        .mount(&server)
        .await;
    let dir = workspace();

    let reference = format!("{}/passport", server.uri().trim_start_matches("http://"));
    let mut config = EngineConfig::default();
    config.fetch.default_scheme = "http".to_string();

    let report = run(&dir, reference, config).await.unwrap();
    let resolved: Vec<_> = report.findings_for(rules::RESOLVE_INPUT).collect();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].evidence("kind"), Some(&"url".into()));

    // The payload has no name: the declared error-level rule fails the run.
    assert_eq!(report.findings_for("has-name").count(), 1);
    assert_eq!(report.passed(), Some(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"{}".to_vec(), "application/json")
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let dir = workspace();

    let err = run(
        &dir,
        format!("{}/slow", server.uri()),
        EngineConfig::default().with_timeout_secs(1),
    )
    .await
    .unwrap_err();
    assert!(
        matches!(err, FatalError::Ingest(IngestError::Timeout { timeout_secs: 1, .. })),
        "{err}"
    );
}
