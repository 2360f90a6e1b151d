//! HTTP handlers for the REST API.

use axum::{extract::State, http::StatusCode, Json};

use super::dto::{HealthResponse, LayerDto, LayerListResponse, ViewportAccepted, ViewportRequest};
use super::error::AppError;
use super::state::AppState;
use crate::services::{CycleOutcome, ReadoutPanel};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cities: state.cities.features.len(),
    }))
}

/// GET /v1/cities
///
/// City features with their five eclipse phase times in epoch milliseconds.
pub async fn list_cities(
    State(state): State<AppState>,
) -> HandlerResult<geojson::FeatureCollection> {
    Ok(Json(state.cities.as_ref().clone()))
}

/// GET /v1/layers
///
/// Catalog layers in draw order, bottom first.
pub async fn list_layers(State(state): State<AppState>) -> HandlerResult<LayerListResponse> {
    let layers: Vec<LayerDto> = state.catalog.entries().iter().map(Into::into).collect();
    let total = layers.len();
    Ok(Json(LayerListResponse { layers, total }))
}

/// GET /v1/panel
pub async fn get_panel(State(state): State<AppState>) -> HandlerResult<ReadoutPanel> {
    let panel = state.cycle.panel().read().clone();
    Ok(Json(panel))
}

/// POST /v1/viewport/stationary
///
/// The client already knows the view has settled: run a cycle now and
/// return the updated panel.
pub async fn viewport_stationary(
    State(state): State<AppState>,
    Json(request): Json<ViewportRequest>,
) -> HandlerResult<CycleOutcome> {
    let viewport = request.validate().map_err(AppError::BadRequest)?;
    let outcome = state.cycle.run(&viewport).await?;
    Ok(Json(outcome))
}

/// POST /v1/viewport
///
/// Raw view change. The cycle runs once the view has been quiet for the
/// debounce window; poll `GET /v1/panel` for the result.
pub async fn viewport_changed(
    State(state): State<AppState>,
    Json(request): Json<ViewportRequest>,
) -> Result<(StatusCode, Json<ViewportAccepted>), AppError> {
    let viewport = request.validate().map_err(AppError::BadRequest)?;

    if !state.debouncer.view_changed(viewport).await {
        return Err(AppError::Unavailable(
            "Viewport debouncer has stopped".to_string(),
        ));
    }

    let quiet = state.debouncer.quiet_window();
    Ok((
        StatusCode::ACCEPTED,
        Json(ViewportAccepted {
            message: "Viewport change accepted".to_string(),
            quiet_ms: u64::try_from(quiet.as_millis()).unwrap_or(u64::MAX),
        }),
    ))
}
