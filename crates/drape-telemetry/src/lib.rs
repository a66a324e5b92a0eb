//! # drape-telemetry
//!
//! Event bus for simulation telemetry. Emits structured per-frame events
//! (integration, collision rounds, convergence, cache writes) that are
//! consumed by pluggable sinks.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, PassKind, SimulationEvent};
pub use sinks::{EventLog, EventSink, TracingSink, VecSink};
