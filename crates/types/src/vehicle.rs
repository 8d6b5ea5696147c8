//! Vehicle record and its lifecycle types.

use crate::time::{millis, opt_millis};
use crate::VehicleId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Approach direction. The lane is shared by exactly two directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    North,
    South,
}

impl Direction {
    /// Both directions, in index order.
    pub const ALL: [Direction; 2] = [Direction::North, Direction::South];

    /// The opposite approach.
    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
        }
    }

    /// Stable index for per-direction arrays.
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::North => "NORTH",
            Direction::South => "SOUTH",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a direction string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown direction: {0}")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    /// Case-insensitive; also accepts the Spanish spellings used by older clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORTH" | "NORTE" | "N" => Ok(Direction::North),
            "SOUTH" | "SUR" | "S" => Ok(Direction::South),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Vehicle speed, an integer in `[1, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub struct Speed(u8);

impl Speed {
    /// Slowest admissible speed.
    pub const MIN: Self = Speed(1);
    /// Fastest admissible speed.
    pub const MAX: Self = Speed(10);

    /// Validate a raw speed. Returns `None` outside `[1, 10]`.
    pub fn new(raw: i64) -> Option<Self> {
        if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&raw) {
            Some(Speed(raw as u8))
        } else {
            None
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// A raw speed outside `[1, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("speed {0} out of range 1..=10")]
pub struct SpeedOutOfRange(pub i64);

impl TryFrom<i64> for Speed {
    type Error = SpeedOutOfRange;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Speed::new(raw).ok_or(SpeedOutOfRange(raw))
    }
}

impl From<Speed> for i64 {
    fn from(speed: Speed) -> Self {
        speed.0 as i64
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-vehicle lifecycle state.
///
/// ```text
/// WAITING → CROSSING → RESTING → WAITING (re-queued)
///                   ↘ RETIRED (stop requested)
/// WAITING | RESTING → RETIRED (evicted or stopped while idle)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VehicleStatus {
    Waiting,
    Crossing,
    Resting,
    Retired,
}

impl VehicleStatus {
    pub fn is_retired(&self) -> bool {
        matches!(self, VehicleStatus::Retired)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VehicleStatus::Waiting => "WAITING",
            VehicleStatus::Crossing => "CROSSING",
            VehicleStatus::Resting => "RESTING",
            VehicleStatus::Retired => "RETIRED",
        };
        f.write_str(s)
    }
}

/// Why a vehicle left the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetireReason {
    /// The client asked to stop and the vehicle drained.
    Stopped,
    /// The liveness monitor saw no heartbeat within the timeout.
    Evicted,
}

impl RetireReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetireReason::Stopped => "stopped",
            RetireReason::Evicted => "evicted",
        }
    }
}

/// A vehicle record, owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,

    /// Correlation token supplied by (or generated for) the client.
    pub token: String,

    pub direction: Direction,

    pub speed: Speed,

    pub status: VehicleStatus,

    #[serde(rename = "registered_at_ms", with = "millis")]
    pub registered_at: Duration,

    #[serde(rename = "last_heartbeat_ms", with = "millis")]
    pub last_heartbeat: Duration,

    /// When the vehicle last joined its directional queue.
    #[serde(rename = "enqueued_at_ms", with = "opt_millis", default)]
    pub enqueued_at: Option<Duration>,

    /// Set only while `status == Crossing`.
    #[serde(rename = "crossing_started_at_ms", with = "opt_millis", default)]
    pub crossing_started_at: Option<Duration>,

    /// Computed crossing duration, set only while `status == Crossing`.
    #[serde(rename = "crossing_duration_ms", with = "opt_millis", default)]
    pub crossing_duration: Option<Duration>,

    /// Set when a resting period begins.
    #[serde(rename = "can_requeue_at_ms", with = "opt_millis", default)]
    pub can_requeue_at: Option<Duration>,

    #[serde(rename = "retired_at_ms", with = "opt_millis", default)]
    pub retired_at: Option<Duration>,

    #[serde(default)]
    pub retire_reason: Option<RetireReason>,

    pub stop_requested: bool,
}

impl Vehicle {
    /// Create a freshly registered vehicle, waiting in its queue.
    pub fn new(
        id: VehicleId,
        token: String,
        direction: Direction,
        speed: Speed,
        now: Duration,
    ) -> Self {
        Self {
            id,
            token,
            direction,
            speed,
            status: VehicleStatus::Waiting,
            registered_at: now,
            last_heartbeat: now,
            enqueued_at: Some(now),
            crossing_started_at: None,
            crossing_duration: None,
            can_requeue_at: None,
            retired_at: None,
            retire_reason: None,
            stop_requested: false,
        }
    }

    /// Whether the vehicle was removed by the liveness monitor.
    pub fn is_evicted(&self) -> bool {
        self.retire_reason == Some(RetireReason::Evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse_spellings() {
        assert_eq!("north".parse::<Direction>(), Ok(Direction::North));
        assert_eq!("NORTE".parse::<Direction>(), Ok(Direction::North));
        assert_eq!(" Sur ".parse::<Direction>(), Ok(Direction::South));
        assert!("east".parse::<Direction>().is_err());
        assert_eq!(Direction::North.opposite(), Direction::South);
    }

    #[test]
    fn test_direction_json() {
        let d: Direction = serde_json::from_str("\"Norte\"").unwrap();
        assert_eq!(d, Direction::North);
        assert_eq!(serde_json::to_string(&Direction::South).unwrap(), "\"SOUTH\"");
    }

    #[test]
    fn test_speed_bounds() {
        assert_eq!(Speed::new(1), Some(Speed::MIN));
        assert_eq!(Speed::new(10), Some(Speed::MAX));
        assert_eq!(Speed::new(0), None);
        assert_eq!(Speed::new(11), None);
        assert_eq!(Speed::new(-3), None);
    }

    #[test]
    fn test_speed_json_is_range_checked() {
        let speed: Speed = serde_json::from_str("4").unwrap();
        assert_eq!(speed.get(), 4);
        assert_eq!(serde_json::to_string(&speed).unwrap(), "4");
        assert!(serde_json::from_str::<Speed>("0").is_err());
        assert!(serde_json::from_str::<Speed>("11").is_err());
        assert!(serde_json::from_str::<Speed>("-1").is_err());
        assert_eq!(Speed::try_from(12), Err(SpeedOutOfRange(12)));
    }

    #[test]
    fn test_vehicle_json_uses_millis() {
        let v = Vehicle::new(
            VehicleId(3),
            "car-3".into(),
            Direction::South,
            Speed::new(7).unwrap(),
            Duration::from_millis(1500),
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["registered_at_ms"], 1500);
        assert_eq!(json["status"], "WAITING");
        assert_eq!(json["direction"], "SOUTH");
        assert!(json["can_requeue_at_ms"].is_null());
    }
}
