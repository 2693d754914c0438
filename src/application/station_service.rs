// Station service - Latest reading per configured sensor for the overview page
use crate::application::sample_repository::SampleRepository;
use crate::domain::reading::Sample;
use crate::infrastructure::config::SensorConfig;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorSummary {
    pub id: String,
    pub title: String,
    pub latest: Option<Sample>,
}

#[derive(Clone)]
pub struct StationService {
    repository: Arc<dyn SampleRepository>,
    source: String,
    sensors: Vec<SensorConfig>,
}

impl StationService {
    pub fn new(repository: Arc<dyn SampleRepository>, source: String, sensors: Vec<SensorConfig>) -> Self {
        Self {
            repository,
            source,
            sensors,
        }
    }

    pub async fn overview(&self) -> Vec<SensorSummary> {
        let mut summaries = Vec::with_capacity(self.sensors.len());

        for sensor in &self.sensors {
            let latest = match self.repository.latest_sample(&self.source, &sensor.id).await {
                Ok(latest) => latest,
                Err(e) => {
                    tracing::error!("Error fetching latest reading for {}: {:#}", sensor.id, e);
                    None
                }
            };

            summaries.push(SensorSummary {
                id: sensor.id.clone(),
                title: sensor.title.clone(),
                latest,
            });
        }

        summaries
    }
}
