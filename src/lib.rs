//! Knob Client
//!
//! Mirrors hardware knob positions streamed by a MIDI control surface proxy
//! over TCP and exposes them as normalized floats to render and audio loops.
//!
//! This library provides:
//! - A background TCP receive task with explicit start/stop
//! - Consistent knob snapshots readable from any thread
//! - Connection health via a status record and an event bus

pub mod bus;
pub mod config;
pub mod error;
pub mod knobs;
pub mod lifecycle;

pub use config::{KnobClientConfig, NUM_KNOBS};
pub use error::KnobError;
pub use knobs::{KnobReader, KnobSnapshot, KnobState};
pub use lifecycle::Startable;
