use crate::derive::{self, DoorEvent, FlaggedSample, TelemetrySummary};
use crate::errors::Error;
use crate::model::{Alert, DeviceInfo, Position, Severity, TelemetrySample, Track};
use crate::source::{DataService, Fetch};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use converter::{DisplayState, Unit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

struct AppState<F> {
    service: Arc<DataService<F>>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TrailQuery {
    upto: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    device_id: Option<String>,
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    #[serde(default)]
    value: String,
    from: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrailResponse {
    pub positions: Vec<Position>,
    pub markers: Vec<FlaggedSample>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub samples: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearUploadResponse {
    pub cleared: bool,
}

pub fn create_router<F: Fetch + 'static>(service: Arc<DataService<F>>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/api/v1/devices", get(get_devices::<F>))
        .route("/api/v1/devices/:id/telemetry", get(get_telemetry::<F>))
        .route("/api/v1/devices/:id/summary", get(get_summary::<F>))
        .route("/api/v1/devices/:id/door-events", get(get_door_events::<F>))
        .route("/api/v1/devices/:id/trail", get(get_trail::<F>))
        .route("/api/v1/alerts", get(get_alerts::<F>))
        .route("/api/v1/track", get(get_track::<F>))
        .route(
            "/api/v1/upload",
            put(put_upload::<F>).delete(delete_upload::<F>),
        )
        .route("/api/v1/cache/clear", post(clear_cache::<F>))
        .route("/api/v1/convert", get(get_conversion))
        .with_state(state)
}

async fn get_devices<F: Fetch + 'static>(State(state): State<AppState<F>>) -> Json<Vec<DeviceInfo>> {
    Json(state.service.devices())
}

async fn get_telemetry<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
    Query(params): Query<WindowQuery>,
) -> Result<Json<Vec<TelemetrySample>>, AppError> {
    let hours = window_hours(params.hours)?;
    let samples = state.service.fetch_telemetry(&id).await?;
    let samples = match hours {
        Some(hours) => derive::filter_recent(&samples, hours),
        None => samples.as_ref().clone(),
    };
    Ok(Json(samples))
}

async fn get_summary<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
    Query(params): Query<WindowQuery>,
) -> Result<Json<TelemetrySummary>, AppError> {
    let hours = window_hours(params.hours)?;
    let samples = state.service.fetch_telemetry(&id).await?;
    Ok(Json(derive::summarize(&samples, hours, Utc::now())))
}

async fn get_door_events<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<DoorEvent>>, AppError> {
    let samples = state.service.fetch_telemetry(&id).await?;
    Ok(Json(derive::door_transitions(&samples)))
}

async fn get_trail<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
    Path(id): Path<String>,
    Query(params): Query<TrailQuery>,
) -> Result<Json<TrailResponse>, AppError> {
    let samples = state.service.fetch_telemetry(&id).await?;
    let upto = params.upto.unwrap_or(usize::MAX);
    Ok(Json(TrailResponse {
        positions: derive::trail(&samples, upto),
        markers: derive::flagged_samples(&samples, upto),
    }))
}

async fn get_alerts<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
    Query(params): Query<AlertQuery>,
) -> Result<Json<Vec<Alert>>, AppError> {
    let severity = params
        .severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()
        .map_err(|e| AppError(Error::Validation(e)))?;

    let alerts = state.service.fetch_alerts().await;
    let alerts = alerts
        .iter()
        .filter(|a| params.device_id.as_ref().map_or(true, |id| &a.device_id == id))
        .filter(|a| severity.map_or(true, |s| a.severity == s))
        .cloned()
        .collect();
    Ok(Json(alerts))
}

async fn get_track<F: Fetch + 'static>(State(state): State<AppState<F>>) -> Json<Option<Track>> {
    Json(state.service.fetch_track().await.map(|t| t.as_ref().clone()))
}

async fn put_upload<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
    body: String,
) -> Result<Json<UploadResponse>, AppError> {
    let samples = state.service.set_upload(body).await?;
    Ok(Json(UploadResponse { samples }))
}

async fn delete_upload<F: Fetch + 'static>(
    State(state): State<AppState<F>>,
) -> Json<ClearUploadResponse> {
    Json(ClearUploadResponse {
        cleared: state.service.clear_upload().await,
    })
}

async fn clear_cache<F: Fetch + 'static>(State(state): State<AppState<F>>) -> StatusCode {
    state.service.clear_cache().await;
    StatusCode::NO_CONTENT
}

async fn get_conversion(Query(params): Query<ConvertQuery>) -> Result<Json<DisplayState>, AppError> {
    let unit = match params.from.as_deref() {
        Some(from) => from.parse::<Unit>()?,
        None => Unit::Celsius,
    };
    Ok(Json(DisplayState::from_input(&params.value, unit)?))
}

fn window_hours(hours: Option<f64>) -> Result<Option<f64>, AppError> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(AppError(Error::Validation(format!(
            "hours must be a non-negative number, got {}",
            h
        )))),
        other => Ok(other),
    }
}

struct AppError(Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::UnknownDevice(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::Json(_) | Error::Conversion(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("API error: {}", self.0);
        } else {
            warn!("Rejected request: {}", self.0);
        }
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
