//! Core abstractions shared by the arbiter and its runners.
//!
//! The arbiter is a synchronous state machine. Runners feed it [`Event`]s
//! (timer firings) after setting the current time, and execute the
//! [`Action`]s it returns (re-arming timers, journaling crossings).

mod action;
mod event;
mod traits;

pub use action::Action;
pub use event::{Event, TimerId};
pub use traits::{Clock, StateMachine};
