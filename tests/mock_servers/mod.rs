//! Mock servers for reader integration testing
//!
//! Simulates the knob proxy so the full connect/receive/stop lifecycle runs
//! against a real socket without control surface hardware.

pub mod knob;

pub use knob::MockKnobServer;
