//! HTTP API.
//!
//! | Method | Path                       | Response                 |
//! |--------|----------------------------|--------------------------|
//! | POST   | `/vehicles`                | `{vehicle, bridge}`      |
//! | GET    | `/vehicles/{id}`           | vehicle record           |
//! | POST   | `/vehicles/{id}/heartbeat` | `{ok: true}`             |
//! | POST   | `/vehicles/{id}/stop`      | `{ok: true}`             |
//! | GET    | `/vehicles/{id}/stats`     | per-vehicle stats        |
//! | GET    | `/queues`                  | ids waiting per direction|
//! | GET    | `/bridge`                  | bridge status            |
//! | GET    | `/health`                  | `{status: "ok"}`         |
//! | GET    | `/metrics`                 | Prometheus text format   |

use crate::runner::BridgeHandle;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use onelane_arbiter::ArbiterError;
use onelane_types::{BridgeStatus, QueueSnapshot, Vehicle, VehicleId, VehicleStats};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

/// Body of `POST /vehicles`.
///
/// Fields are optional at the wire level so that missing values surface as
/// invalid input rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub direction: Option<String>,
    pub speed: Option<i64>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub vehicle: Vehicle,
    pub bridge: BridgeStatus,
}

/// An arbiter error rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ArbiterError);

impl From<ArbiterError> for ApiError {
    fn from(e: ArbiterError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_invalid_input() => StatusCode::BAD_REQUEST,
            ArbiterError::NotFound(_) => StatusCode::NOT_FOUND,
            ArbiterError::ExpiredSession(_) => StatusCode::GONE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.0.kind(),
            "message": self.0.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

pub fn router(handle: BridgeHandle) -> Router {
    Router::new()
        .route("/vehicles", post(register))
        .route("/vehicles/{id}", get(vehicle))
        .route("/vehicles/{id}/heartbeat", post(heartbeat))
        .route("/vehicles/{id}/stop", post(stop))
        .route("/vehicles/{id}/stats", get(stats))
        .route("/queues", get(queues))
        .route("/bridge", get(bridge))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(handle)
}

async fn register(
    State(handle): State<BridgeHandle>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        ArbiterError::MalformedRequest(rejection.body_text())
    })?;
    let direction = ArbiterError::parse_direction(request.direction.as_deref())?;
    let speed = request.speed.ok_or(ArbiterError::MissingSpeed)?;
    let (vehicle, bridge) = handle.register(direction, speed, request.token)?;
    Ok(Json(RegisterResponse { vehicle, bridge }))
}

async fn vehicle(
    State(handle): State<BridgeHandle>,
    Path(id): Path<u64>,
) -> Result<Json<Vehicle>, ApiError> {
    Ok(Json(handle.vehicle(VehicleId(id))?))
}

async fn heartbeat(
    State(handle): State<BridgeHandle>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    handle.heartbeat(VehicleId(id))?;
    Ok(Json(json!({ "ok": true })))
}

async fn stop(
    State(handle): State<BridgeHandle>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    handle.stop(VehicleId(id))?;
    Ok(Json(json!({ "ok": true })))
}

async fn stats(
    State(handle): State<BridgeHandle>,
    Path(id): Path<u64>,
) -> Result<Json<VehicleStats>, ApiError> {
    Ok(Json(handle.stats(VehicleId(id))?))
}

async fn queues(State(handle): State<BridgeHandle>) -> Json<QueueSnapshot> {
    Json(handle.queues())
}

async fn bridge(State(handle): State<BridgeHandle>) -> Json<BridgeStatus> {
    Json(handle.bridge())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(handle): State<BridgeHandle>) -> Response {
    match handle.metrics().render() {
        Ok(text) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], text).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
