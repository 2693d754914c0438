// Repository trait for sensor reading storage
use crate::domain::reading::Sample;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait SampleRepository: Send + Sync {
    /// Readings of one sensor between `start` and `end`, oldest first
    async fn fetch_samples(
        &self,
        source: &str,
        sensor_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Sample>>;

    /// Most recent reading of one sensor, if it ever reported
    async fn latest_sample(&self, source: &str, sensor_id: &str) -> anyhow::Result<Option<Sample>>;

    /// Store one reading
    async fn append_sample(&self, source: &str, sensor_id: &str, sample: &Sample) -> anyhow::Result<()>;
}
