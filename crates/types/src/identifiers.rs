//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Vehicle identifier.
///
/// Assigned sequentially by the registry, starting at 1. The client-supplied
/// correlation token is kept on the [`Vehicle`](crate::Vehicle) record itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VehicleId(pub u64);

impl VehicleId {
    /// The first identifier handed out by a fresh registry.
    pub const FIRST: Self = VehicleId(1);

    /// Get the next identifier in sequence.
    pub fn next(self) -> Self {
        VehicleId(self.0 + 1)
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vehicle({})", self.0)
    }
}
