//! Reader health record
//!
//! Replaces "watch whether the values ever change" as the only way to tell a
//! dead connection from idle knobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Never started
    Idle,
    Connecting,
    Connected,
    /// Peer closed the stream
    Closed,
    Failed,
    /// Cancelled through `stop()`
    Stopped,
}

impl ConnectionState {
    /// Loop is spawned and has not yet reached a terminal state
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnobConnectionStatus {
    pub state: ConnectionState,
    pub host: String,
    pub port: u16,
    pub peer: Option<String>,
    pub last_error: Option<String>,
    /// Receives that landed in the knob state since `start()`
    pub updates: u64,
    pub last_update: Option<DateTime<Utc>>,
}

impl KnobConnectionStatus {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            state: ConnectionState::Idle,
            host: host.into(),
            port,
            peer: None,
            last_error: None,
            updates: 0,
            last_update: None,
        }
    }

    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Clear per-run fields ahead of a new connection attempt
    pub(crate) fn begin_run(&mut self) {
        self.state = ConnectionState::Connecting;
        self.peer = None;
        self.last_error = None;
        self.updates = 0;
        self.last_update = None;
    }
}

pub type SharedStatus = Arc<RwLock<KnobConnectionStatus>>;
