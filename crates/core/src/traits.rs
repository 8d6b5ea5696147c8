//! Core traits for state machines.

use crate::{Action, Event};
use std::time::Duration;

/// A state machine that processes events.
///
/// The bridge arbiter is implemented as a state machine that is:
///
/// - **Synchronous**: No async, no `.await`
/// - **Deterministic**: Same state + time + event = same actions
/// - **Pure-ish**: Mutates self, but performs no I/O
///
/// # Example
///
/// ```ignore
/// impl StateMachine for BridgeArbiter {
///     fn handle(&mut self, event: Event) -> Vec<Action> {
///         match event {
///             Event::SchedulerTick => self.on_scheduler_tick(),
///             Event::LivenessScan => self.on_liveness_scan(),
///         }
///     }
///
///     fn set_time(&mut self, now: Duration) {
///         self.now = now;
///     }
/// }
/// ```
pub trait StateMachine {
    /// Process an event, returning actions to perform.
    ///
    /// # Guarantees
    ///
    /// - **Synchronous**: This method never blocks or awaits
    /// - **Deterministic**: Given the same state and event, always returns the same actions
    /// - **No I/O**: All I/O is performed by the runner via the returned actions
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Set the current time.
    ///
    /// Called by the runner before each `handle()` call and before every
    /// client request, with the current wall-clock or test time.
    fn set_time(&mut self, now: Duration);

    /// Get the current time.
    ///
    /// Returns the time that was last set via `set_time()`.
    fn now(&self) -> Duration;
}

/// Source of the time handed to [`StateMachine::set_time`].
///
/// Runners read it once per event or request. Production uses wall-clock
/// time; tests substitute a clock they advance by hand.
pub trait Clock: Send + Sync {
    /// Time since the clock's epoch.
    fn now(&self) -> Duration;
}
