//! Inbound events driving the arbiter.

/// Events delivered to the arbiter by its runner.
///
/// Client requests are not events: they are direct calls on the arbiter made
/// under the runner's lock. Events are the timer-driven transitions that no
/// client triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Scheduler tick: complete a due crossing, re-queue rested vehicles,
    /// admit the next vehicle if the lane is free.
    SchedulerTick,

    /// Liveness scan: evict idle vehicles with stale heartbeats and purge
    /// retired records past their grace period.
    LivenessScan,
}

impl Event {
    /// The timer that produces this event.
    pub fn timer_id(&self) -> TimerId {
        match self {
            Event::SchedulerTick => TimerId::Scheduler,
            Event::LivenessScan => TimerId::Liveness,
        }
    }
}

/// Identifies a runner-managed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    Scheduler,
    Liveness,
}

impl TimerId {
    /// The event delivered when this timer fires.
    pub fn event(&self) -> Event {
        match self {
            TimerId::Scheduler => Event::SchedulerTick,
            TimerId::Liveness => Event::LivenessScan,
        }
    }
}
