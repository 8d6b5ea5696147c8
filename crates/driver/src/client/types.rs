//! Types for HTTP client communication.

use onelane_types::{BridgeStatus, Vehicle};
use serde::{Deserialize, Serialize};

/// Request to register a vehicle.
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub direction: String,
    pub speed: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Response from registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub vehicle: Vehicle,
    pub bridge: BridgeStatus,
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub message: String,
}

/// Response from the health endpoint.
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
