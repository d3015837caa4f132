//! Hardware knob mirroring
//!
//! A MIDI control surface proxy streams one byte per knob over TCP. This
//! module keeps the latest byte per knob and maps it into caller ranges:
//! - Shared state with consistent snapshots (`state`)
//! - Raw to float mapping (`normalize`)
//! - Connect/receive task (`receive`)
//! - Lifecycle and readers (`reader`)
//! - Health record (`status`)

pub mod normalize;
pub mod reader;
pub mod receive;
pub mod state;
pub mod status;

pub use normalize::{lerp_range, normalize};
pub use reader::KnobReader;
pub use receive::LoopExit;
pub use state::{KnobSnapshot, KnobState};
pub use status::{ConnectionState, KnobConnectionStatus};
