//! HTTP client for the bridge server.

mod types;

pub use types::{ErrorBody, HealthResponse, RegisterRequest, RegisterResponse};

use onelane_types::{BridgeStatus, Direction, QueueSnapshot, Vehicle, VehicleId, VehicleStats};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("server rejected request ({status}, {kind}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },
}

impl ClientError {
    /// The vehicle's session was evicted or already retired.
    pub fn is_expired(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::GONE.as_u16())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }
}

/// Typed wrapper over the server's HTTP API.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: Client,
    base: String,
}

impl BridgeClient {
    /// Create a client for `endpoint` (e.g. `http://127.0.0.1:8050`).
    pub fn new(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            http,
            base: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.base
    }

    pub async fn register(
        &self,
        direction: Direction,
        speed: i64,
        token: Option<String>,
    ) -> Result<RegisterResponse, ClientError> {
        let request = RegisterRequest {
            direction: direction.as_str().to_string(),
            speed,
            token,
        };
        let response = self
            .http
            .post(format!("{}/vehicles", self.base))
            .json(&request)
            .send()
            .await?;
        decode(response).await
    }

    pub async fn vehicle(&self, id: VehicleId) -> Result<Vehicle, ClientError> {
        self.get(&format!("/vehicles/{}", id.0)).await
    }

    pub async fn heartbeat(&self, id: VehicleId) -> Result<(), ClientError> {
        self.post_empty(&format!("/vehicles/{}/heartbeat", id.0))
            .await
    }

    pub async fn stop(&self, id: VehicleId) -> Result<(), ClientError> {
        self.post_empty(&format!("/vehicles/{}/stop", id.0)).await
    }

    pub async fn stats(&self, id: VehicleId) -> Result<VehicleStats, ClientError> {
        self.get(&format!("/vehicles/{}/stats", id.0)).await
    }

    pub async fn queues(&self) -> Result<QueueSnapshot, ClientError> {
        self.get("/queues").await
    }

    pub async fn bridge(&self) -> Result<BridgeStatus, ClientError> {
        self.get("/bridge").await
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        self.get("/health").await
    }

    /// Poll `/health` until it answers or `timeout` elapses.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<(), ClientError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.health().await {
                Ok(_) => return Ok(()),
                Err(e) if tokio::time::Instant::now() >= deadline => return Err(e),
                Err(_) => tokio::time::sleep(Duration::from_millis(500)).await,
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .send()
            .await?;
        decode(response).await
    }

    async fn post_empty(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .send()
            .await?;
        decode::<serde_json::Value>(response).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await?;
    let (kind, message) = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(error) => (error.error, error.message),
        Err(_) => ("unknown".to_string(), body),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        kind,
        message,
    })
}
