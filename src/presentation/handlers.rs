// HTTP request handlers
use crate::application::chart_service::{ChartRequest, ChartServiceError};
use crate::application::ingest_service::IngestError;
use crate::infrastructure::http_response::{accepts_brotli, html_response, svg_response};
use crate::infrastructure::svg_writer::write_svg;
use crate::presentation::app_state::AppState;
use crate::presentation::overview_page::render_overview;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{Local, Utc};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct GraphQuery {
    pub sensor: Option<String>,
    pub db: Option<String>,
    pub offset: Option<i64>,
}

impl From<GraphQuery> for ChartRequest {
    fn from(query: GraphQuery) -> Self {
        ChartRequest {
            sensor_id: query.sensor.filter(|s| !s.is_empty()),
            source: query.db.filter(|s| !s.is_empty()),
            hour_offset: query.offset.unwrap_or(0),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Overview page with the latest reading and chart of every sensor
pub async fn overview(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let sensors = state.station_service.overview().await;
    let html = render_overview(&state.title, &sensors, Local::now().offset());

    match html_response(html, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Chart of one sensor as SVG
pub async fn render_graph(
    Query(query): Query<GraphQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let request = ChartRequest::from(query);

    let drawing = match state
        .chart_service
        .render_chart(&request, Local::now().fixed_offset())
        .await
    {
        Ok(drawing) => drawing,
        Err(e) => {
            match &e {
                ChartServiceError::Source(source) => {
                    tracing::error!("Error fetching samples: {:#}", source)
                }
                ChartServiceError::OutOfRange => tracing::error!("Chart not rendered: {}", e),
                _ => tracing::warn!("Chart not rendered: {}", e),
            }
            return (chart_error_status(&e), e.to_string()).into_response();
        }
    };

    let svg = match write_svg(&drawing) {
        Ok(svg) => svg,
        Err(e) => {
            tracing::error!("SVG serialization error: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match svg_response(svg, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Write endpoint for sensors. Every method is routed here and
/// non-POST requests are rejected during validation.
pub async fn ingest_reading(
    method: Method,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Response {
    match state
        .ingest_service
        .ingest(method.as_str(), &body, Utc::now())
        .await
    {
        Ok(_) => StatusCode::CREATED.into_response(),
        Err(e) => {
            match &e {
                IngestError::Storage(_) => tracing::error!("Ingest failed: {}", e),
                _ => tracing::warn!("Ingest rejected: {}", e),
            }
            (ingest_error_status(&e), e.to_string()).into_response()
        }
    }
}

fn chart_error_status(err: &ChartServiceError) -> StatusCode {
    match err {
        ChartServiceError::NoData => StatusCode::NOT_FOUND,
        ChartServiceError::InvalidOffset(_) => StatusCode::BAD_REQUEST,
        ChartServiceError::OutOfRange | ChartServiceError::Source(_) => StatusCode::BAD_GATEWAY,
    }
}

fn ingest_error_status(err: &IngestError) -> StatusCode {
    match err {
        IngestError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        IngestError::InvalidJson(_)
        | IngestError::NotAnObject
        | IngestError::InvalidFields(_)
        | IngestError::EmptySender
        | IngestError::InvalidSender
        | IngestError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
        IngestError::Unauthorized => StatusCode::UNAUTHORIZED,
        IngestError::Storage(_) => StatusCode::BAD_GATEWAY,
    }
}
