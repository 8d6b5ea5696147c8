//! Direction selection policies.
//!
//! When the lane is free the arbiter builds a [`SelectionView`] of both queue
//! heads and asks its [`FairnessPolicy`] which direction to admit from. The
//! policy only decides; dequeuing and admission stay in the arbiter.

use crate::FairnessConfig;
use onelane_types::Direction;
use std::fmt;
use std::time::Duration;

/// What a policy knows about a queue head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadInfo {
    /// Global arrival sequence (lower arrived earlier).
    pub arrival: u64,
    /// How long the head has been waiting.
    pub waited: Duration,
}

/// Input to a selection decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionView {
    /// Direction of the most recent admission.
    pub current: Option<Direction>,
    /// Consecutive admissions from `current`.
    pub streak: u32,
    /// Queue heads indexed by [`Direction::index`]; `None` for an empty queue.
    pub heads: [Option<HeadInfo>; 2],
}

impl SelectionView {
    pub fn head(&self, direction: Direction) -> Option<&HeadInfo> {
        self.heads[direction.index()].as_ref()
    }

    /// Direction whose head arrived first.
    fn earliest(&self) -> Option<Direction> {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.head(d).map(|h| (h.arrival, d)))
            .min()
            .map(|(_, d)| d)
    }
}

/// Decides which direction is admitted next.
///
/// Implementations must return a direction whose queue is non-empty, or
/// `None` when both are empty.
pub trait FairnessPolicy: fmt::Debug + Send + Sync {
    fn select(&self, view: &SelectionView) -> Option<Direction>;

    /// Policy name, for logging.
    fn name(&self) -> &'static str;
}

/// Prefer the current direction, switching when the opposite side has been
/// skipped too often or its head has waited too long.
///
/// With both queues perpetually non-empty, at most `max_consecutive`
/// admissions in a row come from one direction.
#[derive(Debug, Clone)]
pub struct DirectionFairness {
    max_consecutive: u32,
    max_head_wait: Duration,
}

impl DirectionFairness {
    pub fn new(config: &FairnessConfig) -> Self {
        Self {
            max_consecutive: config.max_consecutive.max(1),
            max_head_wait: config.max_head_wait,
        }
    }
}

impl Default for DirectionFairness {
    fn default() -> Self {
        Self::new(&FairnessConfig::default())
    }
}

impl FairnessPolicy for DirectionFairness {
    fn select(&self, view: &SelectionView) -> Option<Direction> {
        match (view.head(Direction::North), view.head(Direction::South)) {
            (None, None) => None,
            (Some(_), None) => Some(Direction::North),
            (None, Some(_)) => Some(Direction::South),
            (Some(_), Some(_)) => {
                let Some(current) = view.current else {
                    return view.earliest();
                };
                let opposite = current.opposite();
                let opposite_waited = view.head(opposite).map(|h| h.waited).unwrap_or_default();

                if view.streak >= self.max_consecutive || opposite_waited > self.max_head_wait {
                    Some(opposite)
                } else {
                    Some(current)
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "direction-fairness"
    }
}

/// Strict arrival order across both queues, ignoring direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalOrder;

impl FairnessPolicy for ArrivalOrder {
    fn select(&self, view: &SelectionView) -> Option<Direction> {
        view.earliest()
    }

    fn name(&self) -> &'static str {
        "arrival-order"
    }
}
