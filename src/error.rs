//! Error taxonomy for the knob client
//!
//! Receive-loop failures never reach the caller as a return value; they are
//! recorded in the reader's status and published on the bus. Only `start()`
//! and the bounds-checked readers return these directly.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnobError {
    /// No async runtime to host the receive task
    #[error("knob reader could not initialize: {0}")]
    Initialization(String),

    #[error("invalid knob client config: {0}")]
    InvalidConfig(String),

    #[error("failed to resolve {target}: {source}")]
    Resolution {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Every resolved candidate refused or failed the connect
    #[error("unable to connect to {target} ({attempted} address(es) tried): {source}")]
    Connection {
        target: String,
        attempted: usize,
        #[source]
        source: io::Error,
    },

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    #[error("knob index {index} out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, KnobError>;
