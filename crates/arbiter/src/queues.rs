//! Directional admission queues.

use indexmap::IndexMap;
use onelane_types::{Direction, QueueSnapshot, VehicleId};
use std::time::Duration;

/// A vehicle waiting in a directional queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub vehicle_id: VehicleId,
    /// When the vehicle joined the queue.
    pub enqueued_at: Duration,
    /// Global arrival sequence across both queues.
    pub arrival: u64,
}

/// FIFO queues, one per direction.
///
/// Insertion order is arrival order. A vehicle id appears in at most one
/// queue at a time; `enqueue` refuses duplicates across both queues.
#[derive(Debug, Default)]
pub struct DirectionalQueues {
    /// Indexed by [`Direction::index`].
    queues: [IndexMap<VehicleId, QueueEntry>; 2],
    next_arrival: u64,
}

impl DirectionalQueues {
    /// Create empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vehicle to the tail of its direction's queue.
    ///
    /// Returns false (and changes nothing) if the id is already queued in
    /// either direction.
    pub fn enqueue(&mut self, direction: Direction, vehicle_id: VehicleId, now: Duration) -> bool {
        if self.contains(vehicle_id) {
            return false;
        }

        let entry = QueueEntry {
            vehicle_id,
            enqueued_at: now,
            arrival: self.next_arrival,
        };
        self.next_arrival += 1;
        self.queues[direction.index()].insert(vehicle_id, entry);
        true
    }

    /// The head of a direction's queue.
    pub fn peek(&self, direction: Direction) -> Option<&QueueEntry> {
        self.queues[direction.index()].first().map(|(_, entry)| entry)
    }

    /// Remove and return the head of a direction's queue.
    pub fn dequeue(&mut self, direction: Direction) -> Option<QueueEntry> {
        self.queues[direction.index()]
            .shift_remove_index(0)
            .map(|(_, entry)| entry)
    }

    /// Number of vehicles waiting in a direction.
    pub fn size(&self, direction: Direction) -> usize {
        self.queues[direction.index()].len()
    }

    /// Remove a vehicle wherever it is queued, preserving the order of the rest.
    pub fn remove(&mut self, vehicle_id: VehicleId) -> Option<(Direction, QueueEntry)> {
        Direction::ALL.into_iter().find_map(|direction| {
            self.queues[direction.index()]
                .shift_remove(&vehicle_id)
                .map(|entry| (direction, entry))
        })
    }

    /// Whether the vehicle is queued in either direction.
    pub fn contains(&self, vehicle_id: VehicleId) -> bool {
        self.queues.iter().any(|q| q.contains_key(&vehicle_id))
    }

    /// Whether both queues are empty.
    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }

    /// Ordered ids per direction, head first.
    pub fn snapshot(&self) -> QueueSnapshot {
        let ids = |d: Direction| self.queues[d.index()].keys().copied().collect();
        QueueSnapshot {
            north: ids(Direction::North),
            south: ids(Direction::South),
        }
    }
}
