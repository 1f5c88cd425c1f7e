pub mod config;
pub mod database;
pub mod error;
pub mod geometry;
pub mod incidents;
pub mod models;
pub mod orchestrator;
pub mod planner;
pub mod provider;
pub mod scoring;
pub mod zones;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::RouteError;
use crate::geometry::BoundingBox;
use crate::models::{ApiError, BoundsRequest, Coordinate, IncidentReport, RouteRequest};
use crate::orchestrator::RouteOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RouteOrchestrator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/route", post(route_handler))
        .route("/api/reports/bounds", post(reports_in_bounds_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn route_handler(
    State(state): State<AppState>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("rejected route request: {rejection}");
        route_error(RouteError::InvalidInput(rejection.body_text()))
    })?;

    let planned = state
        .orchestrator
        .plan_route(req.origin, req.destination, req.use_safe_routing, req.profile)
        .await
        .map_err(route_error)?;

    Ok(Json(planned.into_response()))
}

async fn reports_in_bounds_handler(
    State(state): State<AppState>,
    payload: Result<Json<BoundsRequest>, JsonRejection>,
) -> Result<Json<Vec<IncidentReport>>, (StatusCode, Json<ApiError>)> {
    let Json(req) = payload
        .map_err(|rejection| route_error(RouteError::InvalidInput(rejection.body_text())))?;
    let bounds = bounds_from_request(&req).map_err(route_error)?;

    let reports = state
        .orchestrator
        .query_incidents(&bounds)
        .await
        .map_err(|err| {
            tracing::error!("bounds query failed: {err}");
            route_error(RouteError::UpstreamUnavailable(err.to_string()))
        })?;

    tracing::debug!("returning {} report(s) for {:?}", reports.len(), bounds);
    Ok(Json(reports))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

fn bounds_from_request(req: &BoundsRequest) -> Result<BoundingBox, RouteError> {
    let (Some(sw_lat), Some(sw_lng), Some(ne_lat), Some(ne_lng)) =
        (req.sw_lat, req.sw_lng, req.ne_lat, req.ne_lng)
    else {
        return Err(RouteError::InvalidInput(
            "sw_lat, sw_lng, ne_lat and ne_lng are required".to_string(),
        ));
    };

    let sw = Coordinate::new(sw_lat, sw_lng);
    let ne = Coordinate::new(ne_lat, ne_lng);
    if !sw.is_valid() || !ne.is_valid() || sw_lat > ne_lat || sw_lng > ne_lng {
        return Err(RouteError::InvalidInput(format!(
            "invalid bounds: sw=({sw_lat}, {sw_lng}) ne=({ne_lat}, {ne_lng})"
        )));
    }

    Ok(BoundingBox::covering(sw, ne))
}

fn route_error(err: RouteError) -> (StatusCode, Json<ApiError>) {
    (
        err.status(),
        Json(ApiError {
            kind: err.kind(),
            message: err.to_string(),
        }),
    )
}
