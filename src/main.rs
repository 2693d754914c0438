// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use anyhow::Context;
use axum::{
    routing::{any, get},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::chart_service::{ChartDefaults, ChartService};
use crate::application::ingest_service::IngestService;
use crate::application::station_service::StationService;
use crate::domain::projection::{ChartProjector, Geometry};
use crate::infrastructure::config::{load_influx_config, load_station_config};
use crate::infrastructure::influx_repository::InfluxRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, ingest_reading, overview, render_graph};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let influx_config = load_influx_config().context("Failed to load config/influx")?;
    let station_config = load_station_config().context("Failed to load config/station")?;
    let influx = influx_config.influx;
    let station = station_config.station;

    // Create repository (infrastructure layer)
    let repository = Arc::new(InfluxRepository::new(
        influx.host,
        influx.token,
        influx.retention_policy,
        influx.measurement,
    ));

    // Create services (application layer)
    let chart_service = ChartService::new(
        repository.clone(),
        ChartProjector::new(Geometry::default()),
        ChartDefaults {
            sensor_id: station.default_sensor.clone(),
            source: influx.database.clone(),
            lookback_hours: station.lookback_hours,
        },
    );
    let ingest_service = IngestService::new(
        repository.clone(),
        influx.database.clone(),
        station.ingest_credential.clone(),
    );
    let station_service = StationService::new(repository, influx.database, station_config.sensors);

    let state = Arc::new(AppState {
        title: station.title,
        chart_service,
        ingest_service,
        station_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/", get(overview))
        .route("/healthz", get(health_check))
        .route("/graph", get(render_graph))
        .route("/sensor", any(ingest_reading))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = station
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", station.listen_addr))?;
    tracing::info!("Starting weather-station service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
