//! Serde helpers for timestamps.
//!
//! Every timestamp in the coordinator is a `Duration` since a fixed epoch
//! (UNIX time for the production runner). On the wire they are integer
//! milliseconds.

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// `#[serde(with = "onelane_types::time::millis")]` for `Duration` fields.
pub mod millis {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// `#[serde(with = "onelane_types::time::opt_millis")]` for `Option<Duration>` fields.
pub mod opt_millis {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
