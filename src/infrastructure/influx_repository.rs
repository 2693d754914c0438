// InfluxDB repository implementation
use crate::application::sample_repository::SampleRepository;
use crate::domain::reading::Sample;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

const TEMPERATURE_FIELD: &str = "temp";
const HUMIDITY_FIELD: &str = "humidity";
const MISSING_HUMIDITY: f64 = -1.0;

#[derive(Debug, Clone)]
pub struct InfluxRepository {
    client: reqwest::Client,
    host: String,
    token: String,
    retention_policy: String,
    measurement: String,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
}

impl InfluxRepository {
    pub fn new(host: String, token: String, retention_policy: String, measurement: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            token,
            retention_policy,
            measurement,
        }
    }

    fn build_query_url(&self, database: &str, query: &str) -> String {
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host,
            urlencoding::encode(database),
            urlencoding::encode(&self.retention_policy),
            urlencoding::encode(query)
        )
    }

    fn build_write_url(&self, database: &str) -> String {
        format!(
            "{}/write?db={}&rp={}&precision=s",
            self.host,
            urlencoding::encode(database),
            urlencoding::encode(&self.retention_policy)
        )
    }

    async fn execute_query(&self, database: &str, query: &str) -> Result<InfluxQLResponse> {
        let url = self.build_query_url(database, query);
        tracing::debug!("Executing InfluxQL on {}: {}", database, query);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(result) = data.results.first() {
            if let Some(error) = &result.error {
                anyhow::bail!("InfluxDB query error: {}", error);
            }
        }

        Ok(data)
    }

    fn select_readings(&self, sensor_id: &str) -> String {
        format!(
            "SELECT \"{}\", \"{}\" FROM \"{}\" WHERE \"sender_id\" = '{}'",
            TEMPERATURE_FIELD,
            HUMIDITY_FIELD,
            escape_identifier(&self.measurement),
            escape_literal(sensor_id)
        )
    }

    fn range_query(&self, sensor_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        format!(
            "{} AND time >= '{}' AND time <= '{}' ORDER BY time ASC",
            self.select_readings(sensor_id),
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
            end.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }

    fn latest_query(&self, sensor_id: &str) -> String {
        format!("{} ORDER BY time DESC LIMIT 1", self.select_readings(sensor_id))
    }

    /// One line of InfluxDB line protocol for a reading
    fn line_protocol(&self, sensor_id: &str, sample: &Sample) -> String {
        format!(
            "{},sender_id={} {}={},{}={} {}",
            escape_measurement(&self.measurement),
            escape_tag(sensor_id),
            TEMPERATURE_FIELD,
            sample.temperature,
            HUMIDITY_FIELD,
            sample.humidity,
            sample.timestamp.timestamp()
        )
    }
}

#[async_trait]
impl SampleRepository for InfluxRepository {
    async fn fetch_samples(
        &self,
        source: &str,
        sensor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>> {
        let query = self.range_query(sensor_id, start, end);
        let response = self.execute_query(source, &query).await?;
        let samples = parse_samples(&response);

        tracing::debug!("Found {} readings for sensor {}", samples.len(), sensor_id);
        Ok(samples)
    }

    async fn latest_sample(&self, source: &str, sensor_id: &str) -> Result<Option<Sample>> {
        let query = self.latest_query(sensor_id);
        let response = self.execute_query(source, &query).await?;
        Ok(parse_samples(&response).into_iter().next())
    }

    async fn append_sample(&self, source: &str, sensor_id: &str, sample: &Sample) -> Result<()> {
        let url = self.build_write_url(source);
        let line = self.line_protocol(sensor_id, sample);
        tracing::debug!("Writing to {}: {}", source, line);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.token))
            .body(line)
            .send()
            .await
            .context("Failed to send write to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB write failed with status {}: {}", status, body);
        }

        Ok(())
    }
}

/// Rows of the first result; rows without a usable time or temperature are skipped
fn parse_samples(response: &InfluxQLResponse) -> Vec<Sample> {
    let mut samples = Vec::new();
    let Some(series) = response.results.first().and_then(|r| r.series.as_ref()) else {
        return samples;
    };

    for s in series {
        let time_idx = s.columns.iter().position(|c| c == "time").unwrap_or(0);
        let temp_idx = s.columns.iter().position(|c| c == TEMPERATURE_FIELD).unwrap_or(1);
        let humidity_idx = s.columns.iter().position(|c| c == HUMIDITY_FIELD).unwrap_or(2);

        for row in &s.values {
            let time = row
                .get(time_idx)
                .and_then(|v| v.as_str())
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok());
            let temperature = row.get(temp_idx).and_then(|v| v.as_f64());

            if let (Some(time), Some(temperature)) = (time, temperature) {
                let humidity = row
                    .get(humidity_idx)
                    .and_then(|v| v.as_f64())
                    .unwrap_or(MISSING_HUMIDITY);
                samples.push(Sample::new(time.with_timezone(&Utc), temperature, humidity));
            }
        }
    }

    samples
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn escape_identifier(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_measurement(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
