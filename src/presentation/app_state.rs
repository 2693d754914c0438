// Application state for HTTP handlers
use crate::application::chart_service::ChartService;
use crate::application::ingest_service::IngestService;
use crate::application::station_service::StationService;

#[derive(Clone)]
pub struct AppState {
    pub title: String,
    pub chart_service: ChartService,
    pub ingest_service: IngestService,
    pub station_service: StationService,
}
