//! # Network Adapter
//!
//! `fetch(reference) -> Artifact`. A blocking `reqwest` client with a
//! bounded timeout; the run is synchronous, so there is no runtime to share.
//!
//! Failures map onto distinct [`IngestError`] variants: a non-2xx status is
//! `HttpStatus`, an elapsed timeout is `Timeout`, anything else on the
//! transport is `Network`.

use std::time::Duration;

use dpp_core::artifact::has_jsonld_context;
use dpp_core::{sniff_json_kind, Artifact, ArtifactKind, DigitalLink};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Map, Value};
use url::Url;

use crate::config::FetchConfig;
use crate::error::IngestError;

/// Content negotiation preference: JSON-LD, JSON, credentials, Turtle.
pub const ACCEPT_HEADER: &str =
    "application/ld+json, application/json;q=0.9, application/vc+jwt;q=0.8, text/turtle;q=0.7, */*;q=0.1";

/// Anything that can turn a reference into an artifact over the network.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, reference: &str) -> Result<Artifact, IngestError>;
}

/// [`Fetcher`] backed by a blocking HTTP client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| IngestError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Turn a reference into an http(s) URL.
    ///
    /// A reference without a scheme (`example.org/passport`,
    /// `127.0.0.1:8080/x`) gets [`FetchConfig::default_scheme`] prefixed.
    pub fn resolve_url(&self, reference: &str) -> Result<Url, IngestError> {
        let reference = reference.trim();
        let url = match Url::parse(reference) {
            // `localhost:8080/x` parses as scheme `localhost`.
            Ok(url) if url.cannot_be_a_base() && looks_like_host_port(reference) => {
                self.with_default_scheme(reference)?
            }
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => self.with_default_scheme(reference)?,
            Err(e) => {
                return Err(IngestError::InvalidReference {
                    reference: reference.to_string(),
                    reason: e.to_string(),
                })
            }
        };
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(IngestError::UnsupportedScheme {
                url: url.to_string(),
                scheme: other.to_string(),
            }),
        }
    }

    fn with_default_scheme(&self, reference: &str) -> Result<Url, IngestError> {
        if reference.is_empty() || reference.contains(char::is_whitespace) {
            return Err(IngestError::InvalidReference {
                reference: reference.to_string(),
                reason: "not a URL".to_string(),
            });
        }
        let candidate = format!("{}://{}", self.config.default_scheme, reference);
        let url = Url::parse(&candidate).map_err(|e| IngestError::InvalidReference {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(IngestError::InvalidReference {
                reference: reference.to_string(),
                reason: "no host".to_string(),
            });
        }
        Ok(url)
    }

    fn transport_error(&self, url: &Url, e: reqwest::Error) -> IngestError {
        if e.is_timeout() {
            IngestError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            IngestError::Network {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, reference: &str) -> Result<Artifact, IngestError> {
        let url = self.resolve_url(reference)?;
        tracing::info!(url = %url, "fetching");

        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, ACCEPT_HEADER)
            .send()
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(IngestError::TooLarge {
                url: url.to_string(),
                limit,
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mut headers = Map::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_string(), Value::String(v.to_string()));
            }
        }

        let body = response.bytes().map_err(|e| self.transport_error(&url, e))?;
        if body.len() as u64 > limit {
            return Err(IngestError::TooLarge {
                url: url.to_string(),
                limit,
            });
        }

        let kind = kind_for_content_type(content_type.as_deref(), &body);
        tracing::debug!(url = %final_url, kind = %kind, bytes = body.len(), "fetched");

        let mut artifact = Artifact::new(final_url, content_type, kind, body.to_vec())
            .with_metadata("status_code", status.as_u16())
            .with_metadata("headers", Value::Object(headers));
        if kind == ArtifactKind::PayloadDocument && has_jsonld_context(&body) {
            artifact = artifact.with_metadata("jsonld", true);
        }
        if let Some(link) = DigitalLink::parse(reference) {
            let attrs: Map<String, Value> = link
                .attributes()
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            artifact = artifact.with_metadata("digital_link", Value::Object(attrs));
        }
        Ok(artifact)
    }
}

fn looks_like_host_port(reference: &str) -> bool {
    reference
        .split_once(':')
        .is_some_and(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Infer an artifact kind from a response content type, sniffing JSON bodies.
pub fn kind_for_content_type(content_type: Option<&str>, body: &[u8]) -> ArtifactKind {
    let ct = content_type.unwrap_or_default().to_ascii_lowercase();
    if ct.contains("turtle") || ct.contains("n-triples") || ct.contains("n-quads") {
        ArtifactKind::RdfGraph
    } else if ct.contains("jwt") {
        ArtifactKind::CredentialToken
    } else if ct.contains("schema+json") {
        ArtifactKind::JsonSchema
    } else if ct.contains("aasx") || ct.contains("asset-administration-shell-package") {
        ArtifactKind::AasxPackage
    } else {
        sniff_json_kind(body)
    }
}
