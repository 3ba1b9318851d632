//! Gattcast harness
//!
//! Test and demo plumbing for the gattcast protocol: event-channel helpers
//! and an in-memory transport with scriptable backpressure, plus a loopback
//! pair wiring two links back to back. No radio involved; everything runs on
//! the caller's thread so tests stay deterministic.

pub mod channels;
pub mod loopback;

pub use channels::{create_event_channel, drain_events};
pub use loopback::{LoopbackPair, ScriptedSink};
