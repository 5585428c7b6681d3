//! CMOP map REST API client
//!
//! Every call returns an [`Envelope`]; transport faults never escape as
//! errors. The client owns one pooled HTTP connection context from
//! construction until it is dropped.

use async_trait::async_trait;
use cmop_common::{Envelope, ErrorKind, Telemetry};
use cmop_config::Config;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, Instrument};

/// Client construction errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
    #[error("invalid CMOP API base URL: {0}")]
    InvalidBase(String),
}

/// Read-only queries against the CMOP map service
#[async_trait]
pub trait CmopApi: Send + Sync {
    /// `GET /api/entities`
    async fn get_entities(&self) -> Envelope;
    /// `GET /api/entities/{id}`
    async fn get_entity(&self, entity_id: i64) -> Envelope;
    /// `GET /api/entities/categoria/{category}`
    async fn get_entities_by_category(&self, category: &str) -> Envelope;
    /// `GET /api/entities/cerca/{lng}/{lat}?radio={radius_m}`
    async fn get_nearby_entities(&self, longitude: f64, latitude: f64, radius_m: i64) -> Envelope;
    /// `GET /api/medical/casualties`
    async fn get_casualties(&self) -> Envelope;
    /// `GET /api/medical/triage/{color}`
    async fn get_casualties_by_triage(&self, color: &str) -> Envelope;
    /// `GET /api/medical/evac-stage/{stage}`
    async fn get_casualties_by_evac_stage(&self, stage: &str) -> Envelope;
    /// `GET /api/medical/{id}/nine-line`
    async fn get_nine_line(&self, entity_id: i64) -> Envelope;
    /// `GET /api/schema`
    async fn get_schema(&self) -> Envelope;
    /// `GET /api/scenarios`
    async fn get_scenarios(&self) -> Envelope;
}

/// HTTP implementation of [`CmopApi`]
pub struct CmopClient {
    http: Client,
    api_base: String,
    base_url: Url,
    timeout: Duration,
    telemetry: Telemetry,
}

impl CmopClient {
    pub fn new(
        api_base: impl Into<String>,
        timeout: Duration,
        telemetry: Telemetry,
    ) -> Result<Self, ClientError> {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let base_url = Url::parse(&api_base)
            .map_err(|e| ClientError::InvalidBase(format!("{}: {}", api_base, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidBase(api_base));
        }

        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base,
            base_url,
            timeout,
            telemetry,
        })
    }

    pub fn from_config(config: &Config, telemetry: Telemetry) -> Result<Self, ClientError> {
        Self::new(config.api_base(), config.request_timeout(), telemetry)
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Envelope {
        let url = self.endpoint(segments);
        let path = url.path().to_string();
        let span = self.telemetry.http_span(&path);
        async {
            let result = self.http.get(url).query(query).send().await;

            let envelope = match result {
                Ok(response) => self.decode(&path, response).await,
                Err(e) => self.transport_failure(e),
            };
            debug!(success = envelope.is_success(), "GET {}", path);
            envelope
        }
        .instrument(span)
        .await
    }

    async fn decode(&self, path: &str, response: reqwest::Response) -> Envelope {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Envelope::fail(ErrorKind::NotFound, format!("Resource not found: {}", path));
        }
        if status.is_server_error() {
            return Envelope::fail(
                ErrorKind::ServerError,
                format!("CMOP API server error (HTTP {})", status.as_u16()),
            );
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return self.transport_failure(e),
        };

        if status.is_client_error() {
            let snippet: String = text.chars().take(200).collect();
            return Envelope::fail(
                ErrorKind::ClientError,
                format!("Invalid request (HTTP {}): {}", status.as_u16(), snippet),
            );
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(body) => Envelope::ok(unwrap_data(body)),
            Err(e) => Envelope::fail(
                ErrorKind::InvalidJson,
                format!("Failed to parse response: {}", e),
            ),
        }
    }

    fn transport_failure(&self, error: reqwest::Error) -> Envelope {
        if error.is_timeout() {
            Envelope::fail(
                ErrorKind::Timeout,
                format!("Request timeout after {}s", self.timeout.as_secs_f64()),
            )
        } else if error.is_connect() {
            Envelope::fail(
                ErrorKind::ConnectionRefused,
                format!(
                    "Cannot connect to CMOP API at {}. Is the server running?",
                    self.api_base
                ),
            )
        } else {
            Envelope::fail(ErrorKind::NetworkError, format!("Network error: {}", error))
        }
    }
}

/// `{"data": X}` becomes `X`; any other body passes through
fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl CmopApi for CmopClient {
    async fn get_entities(&self) -> Envelope {
        self.get(&["api", "entities"], &[]).await
    }

    async fn get_entity(&self, entity_id: i64) -> Envelope {
        let id = entity_id.to_string();
        self.get(&["api", "entities", &id], &[]).await
    }

    async fn get_entities_by_category(&self, category: &str) -> Envelope {
        self.get(&["api", "entities", "categoria", category], &[])
            .await
    }

    async fn get_nearby_entities(&self, longitude: f64, latitude: f64, radius_m: i64) -> Envelope {
        let (lng, lat) = (longitude.to_string(), latitude.to_string());
        self.get(
            &["api", "entities", "cerca", &lng, &lat],
            &[("radio", radius_m.to_string())],
        )
        .await
    }

    async fn get_casualties(&self) -> Envelope {
        self.get(&["api", "medical", "casualties"], &[]).await
    }

    async fn get_casualties_by_triage(&self, color: &str) -> Envelope {
        self.get(&["api", "medical", "triage", color], &[]).await
    }

    async fn get_casualties_by_evac_stage(&self, stage: &str) -> Envelope {
        self.get(&["api", "medical", "evac-stage", stage], &[])
            .await
    }

    async fn get_nine_line(&self, entity_id: i64) -> Envelope {
        let id = entity_id.to_string();
        self.get(&["api", "medical", &id, "nine-line"], &[]).await
    }

    async fn get_schema(&self) -> Envelope {
        self.get(&["api", "schema"], &[]).await
    }

    async fn get_scenarios(&self) -> Envelope {
        self.get(&["api", "scenarios"], &[]).await
    }
}
