// Chart service - Use case for rendering one sensor's chart
use crate::application::sample_repository::SampleRepository;
use crate::domain::drawing::Drawing;
use crate::domain::projection::{ChartError, ChartProjector};
use crate::domain::reading::Window;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartServiceError {
    #[error("no data for window")]
    NoData,
    #[error("hour offset must not be negative, got {0}")]
    InvalidOffset(i64),
    #[error("stored readings are outside the chartable temperature range")]
    OutOfRange,
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

impl From<ChartError> for ChartServiceError {
    fn from(err: ChartError) -> Self {
        match err {
            ChartError::NoData => ChartServiceError::NoData,
            ChartError::OutOfRange => ChartServiceError::OutOfRange,
        }
    }
}

/// Values used when a request leaves a field out.
#[derive(Debug, Clone)]
pub struct ChartDefaults {
    pub sensor_id: String,
    pub source: String,
    pub lookback_hours: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ChartRequest {
    pub sensor_id: Option<String>,
    pub source: Option<String>,
    /// Hours between now and the end of the charted window
    pub hour_offset: i64,
}

#[derive(Clone)]
pub struct ChartService {
    repository: Arc<dyn SampleRepository>,
    projector: ChartProjector,
    defaults: ChartDefaults,
}

impl ChartService {
    pub fn new(
        repository: Arc<dyn SampleRepository>,
        projector: ChartProjector,
        defaults: ChartDefaults,
    ) -> Self {
        Self {
            repository,
            projector,
            defaults,
        }
    }

    pub async fn render_chart(
        &self,
        request: &ChartRequest,
        now: DateTime<FixedOffset>,
    ) -> Result<Drawing, ChartServiceError> {
        if request.hour_offset < 0 {
            return Err(ChartServiceError::InvalidOffset(request.hour_offset));
        }

        let sensor_id = request.sensor_id.as_deref().unwrap_or(&self.defaults.sensor_id);
        let source = request.source.as_deref().unwrap_or(&self.defaults.source);
        let window = Window::new(
            now - Duration::hours(request.hour_offset),
            self.defaults.lookback_hours,
        );

        let samples = self
            .repository
            .fetch_samples(
                source,
                sensor_id,
                window.start().with_timezone(&Utc),
                window.end.with_timezone(&Utc),
            )
            .await?;

        tracing::debug!(
            "Fetched {} samples for sensor {} from {}",
            samples.len(),
            sensor_id,
            source
        );

        let drawing = self.projector.project(&samples, &window)?;

        tracing::info!(
            "Rendered chart for sensor {} ({} polylines)",
            sensor_id,
            drawing.polylines.len()
        );

        Ok(drawing)
    }
}
