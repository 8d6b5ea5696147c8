//! Production runner for the one-lane bridge coordinator.
//!
//! Wraps a [`BridgeArbiter`](onelane_arbiter::BridgeArbiter) in a tokio event
//! loop and serves it over HTTP.
//!
//! # Architecture
//!
//! ```text
//!  HTTP handlers (axum)                 timer tasks (tokio::spawn)
//!        │                                     │
//!        │ register / heartbeat / stop         │ Event::SchedulerTick
//!        │ stats                               │ Event::LivenessScan
//!        ▼                                     ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ BridgeHandle                                                │
//! │                                                             │
//! │   Mutex<BridgeArbiter>   set_time(clock.now()) then call    │
//! │          │                                                  │
//! │          ├──► ArcSwap<ArbiterSnapshot>  (bridge, queues,    │
//! │          │                               vehicle reads)     │
//! │          └──► Vec<Action>                                   │
//! │                 SetTimer        → spawn sleep, send event   │
//! │                 RecordCrossing  → CrossingJournal::append   │
//! │                 VehicleRetired  → log                       │
//! │                                                             │
//! │   BridgeMetrics   counters from actions, gauges from the    │
//! │                   snapshot, served on GET /metrics          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The arbiter never blocks and never reads a clock; everything here is
//! plumbing around it.

pub mod clock;
pub mod config;
pub mod http;
pub mod journal;
pub mod metrics;
pub mod runner;
pub mod telemetry;

pub use clock::SystemClock;
pub use config::{ConfigError, ListenConfig, ServerConfig};
pub use http::{router, ApiError, RegisterRequest, RegisterResponse};
pub use journal::{CrossingJournal, JournalError};
pub use metrics::BridgeMetrics;
pub use runner::{BridgeHandle, BridgeRunner};
pub use telemetry::init_tracing;
