//! Outbound actions for the runner to perform.

use crate::TimerId;
use onelane_types::{CrossingRecord, RetireReason, VehicleId};
use std::time::Duration;

/// Side effects requested by the arbiter.
///
/// The arbiter performs no I/O; everything observable outside the process
/// goes through one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fire `id` again after `duration`.
    SetTimer { id: TimerId, duration: Duration },

    /// A crossing completed. Runners with a journal append it.
    RecordCrossing(CrossingRecord),

    /// A vehicle left the system.
    VehicleRetired {
        vehicle_id: VehicleId,
        reason: RetireReason,
    },
}

impl Action {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::SetTimer { .. } => "SetTimer",
            Action::RecordCrossing(_) => "RecordCrossing",
            Action::VehicleRetired { .. } => "VehicleRetired",
        }
    }
}
