//! Error types for arbiter requests.

use onelane_types::{Direction, VehicleId};
use thiserror::Error;

/// Errors surfaced to callers of the arbiter.
///
/// None of these are fatal: every failure is per-request and leaves the
/// bridge, queues and registry untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArbiterError {
    /// Speed outside `[1, 10]`.
    #[error("Invalid speed {0}: must be between 1 and 10")]
    InvalidSpeed(i64),

    /// Registration without a speed.
    #[error("Missing speed")]
    MissingSpeed,

    /// Direction string not recognised.
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    /// Registration without a direction.
    #[error("Missing direction")]
    MissingDirection,

    /// Request body that is not a well-typed registration.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The id was never issued, or its record has been purged.
    #[error("{0} not found")]
    NotFound(VehicleId),

    /// The vehicle was evicted (or already retired, for heartbeats).
    #[error("Session for {0} expired")]
    ExpiredSession(VehicleId),
}

impl ArbiterError {
    /// Whether this error belongs to the invalid-input category.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ArbiterError::InvalidSpeed(_)
                | ArbiterError::MissingSpeed
                | ArbiterError::InvalidDirection(_)
                | ArbiterError::MissingDirection
                | ArbiterError::MalformedRequest(_)
        )
    }

    /// Short machine-readable kind, used in error response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ArbiterError::InvalidSpeed(_)
            | ArbiterError::MissingSpeed
            | ArbiterError::InvalidDirection(_)
            | ArbiterError::MissingDirection
            | ArbiterError::MalformedRequest(_) => "invalid_input",
            ArbiterError::NotFound(_) => "not_found",
            ArbiterError::ExpiredSession(_) => "expired_session",
        }
    }

    /// Parse an optional raw direction as received from a client.
    pub fn parse_direction(raw: Option<&str>) -> Result<Direction, ArbiterError> {
        let raw = raw.ok_or(ArbiterError::MissingDirection)?;
        if raw.trim().is_empty() {
            return Err(ArbiterError::MissingDirection);
        }
        raw.parse()
            .map_err(|_| ArbiterError::InvalidDirection(raw.to_string()))
    }
}
