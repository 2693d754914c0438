// Ingest service - Validates and stores readings pushed by sensors
use crate::application::sample_repository::SampleRepository;
use crate::domain::reading::Sample;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("request method must be POST, got {0}")]
    MethodNotAllowed(String),
    #[error("received content contained invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("received JSON is not an object")]
    NotAnObject,
    #[error("missing or invalid fields: {0}")]
    InvalidFields(#[source] serde_json::Error),
    #[error("sender_id must not be empty")]
    EmptySender,
    #[error("sender_id must not contain control characters")]
    InvalidSender,
    #[error("reading out of range: {temperature} °C, {humidity} %")]
    OutOfRange { temperature: f64, humidity: f64 },
    #[error("invalid credential")]
    Unauthorized,
    #[error("failed to store reading: {0:#}")]
    Storage(anyhow::Error),
}

/// Body sent by a sensor
#[derive(Debug, Deserialize)]
struct IngestPayload {
    sender_id: String,
    temperature: f64,
    humidity: f64,
    #[serde(default, alias = "password")]
    credential: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestedReading {
    pub sensor_id: String,
    pub sample: Sample,
}

#[derive(Clone)]
pub struct IngestService {
    repository: Arc<dyn SampleRepository>,
    source: String,
    credential: Option<String>,
}

impl IngestService {
    pub fn new(repository: Arc<dyn SampleRepository>, source: String, credential: Option<String>) -> Self {
        Self {
            repository,
            source,
            credential,
        }
    }

    /// Validate a write request and append one reading stamped with `now`.
    /// Nothing is written unless every check passes.
    pub async fn ingest(
        &self,
        method: &str,
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Result<IngestedReading, IngestError> {
        let payload = self.validate(method, body)?;

        let sample = Sample::new(now, payload.temperature, payload.humidity);
        if !sample.is_plausible() {
            return Err(IngestError::OutOfRange {
                temperature: sample.temperature,
                humidity: sample.humidity,
            });
        }

        self.repository
            .append_sample(&self.source, &payload.sender_id, &sample)
            .await
            .map_err(IngestError::Storage)?;

        tracing::info!(
            "Stored reading from {}: {:.1} °C, {:.1} %",
            payload.sender_id,
            sample.temperature,
            sample.humidity
        );

        Ok(IngestedReading {
            sensor_id: payload.sender_id,
            sample,
        })
    }

    fn validate(&self, method: &str, body: &[u8]) -> Result<IngestPayload, IngestError> {
        if !method.eq_ignore_ascii_case("POST") {
            return Err(IngestError::MethodNotAllowed(method.to_string()));
        }

        let value: serde_json::Value = serde_json::from_slice(body).map_err(IngestError::InvalidJson)?;
        if !value.is_object() {
            return Err(IngestError::NotAnObject);
        }

        let payload: IngestPayload = serde_json::from_value(value).map_err(IngestError::InvalidFields)?;
        if payload.sender_id.trim().is_empty() {
            return Err(IngestError::EmptySender);
        }
        if payload.sender_id.chars().any(char::is_control) {
            return Err(IngestError::InvalidSender);
        }

        if let Some(expected) = &self.credential {
            if payload.credential.as_deref() != Some(expected.as_str()) {
                return Err(IngestError::Unauthorized);
            }
        }

        Ok(payload)
    }
}
