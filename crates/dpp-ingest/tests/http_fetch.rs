//! Network adapter tests against a local mock server.
//!
//! The fetcher is blocking, so each call runs on the blocking pool while
//! the mock server keeps serving on the runtime.

use std::time::Duration;

use dpp_core::ArtifactKind;
use dpp_ingest::{Fetcher, FetchConfig, HttpFetcher, IngestError};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(scheme: &str, timeout_secs: u64) -> FetchConfig {
    FetchConfig {
        timeout_secs,
        default_scheme: scheme.to_string(),
        ..FetchConfig::default()
    }
}

async fn fetch(reference: String, cfg: FetchConfig) -> Result<dpp_core::Artifact, IngestError> {
    tokio::task::spawn_blocking(move || HttpFetcher::new(cfg)?.fetch(&reference))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_jsonld_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/passport"))
        .and(header_exists("accept"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            br#"{"@context": {"@vocab": "https://schema.org/"}, "name": "Example"}"#.to_vec(),
            "application/ld+json",
        ))
        .mount(&server)
        .await;

    let artifact = fetch(format!("{}/passport", server.uri()), config("https", 5))
        .await
        .unwrap();
    assert_eq!(artifact.kind(), ArtifactKind::PayloadDocument);
    assert_eq!(artifact.content_type(), Some("application/ld+json"));
    assert_eq!(artifact.metadata()["status_code"], 200);
    assert_eq!(artifact.metadata()["jsonld"], true);
    assert!(artifact.metadata()["headers"].get("content-type").is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_aas_environment_is_sniffed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/aas"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(br#"{"assetAdministrationShells": []}"#.to_vec(), "application/json"),
        )
        .mount(&server)
        .await;

    let artifact = fetch(format!("{}/aas", server.uri()), config("https", 5)).await.unwrap();
    assert_eq!(artifact.kind(), ArtifactKind::AasPayload);
}

#[tokio::test(flavor = "multi_thread")]
async fn not_found_is_http_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = fetch(format!("{}/missing", server.uri()), config("https", 5))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::HttpStatus { status: 404, .. }), "{err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn slow_response_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = fetch(format!("{}/slow", server.uri()), config("https", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Timeout { timeout_secs: 1, .. }), "{err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn closed_port_is_network_error() {
    let err = fetch("http://127.0.0.1:1/passport".to_string(), config("https", 2))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Network { .. }), "{err}");
}

#[tokio::test(flavor = "multi_thread")]
async fn scheme_less_reference_resolves_with_default_scheme() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/passport"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(br#"{"id": "x"}"#.to_vec(), "application/json"))
        .mount(&server)
        .await;

    let reference = format!("{}/passport", server.address());
    let artifact = fetch(reference, config("http", 5)).await.unwrap();
    assert_eq!(artifact.kind(), ArtifactKind::PayloadDocument);
    assert!(artifact.uri().starts_with("http://"));
}

#[tokio::test(flavor = "multi_thread")]
async fn digital_link_attributes_are_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/01/09506000134352/21/SER1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(br#"{"id": "x"}"#.to_vec(), "application/json"))
        .mount(&server)
        .await;

    let reference = format!("{}/01/09506000134352/21/SER1", server.uri());
    let artifact = fetch(reference, config("https", 5)).await.unwrap();
    let link = &artifact.metadata()["digital_link"];
    assert_eq!(link["01"], "09506000134352");
    assert_eq!(link["21"], "SER1");
}
