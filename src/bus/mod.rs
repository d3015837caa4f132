//! Event bus for reader lifecycle notifications
//!
//! Uses tokio::sync::broadcast for pub/sub pattern.
//! The receive task is the only publisher; hosts subscribe to observe
//! connection health instead of polling knob values for signs of life.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event types that can be published on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BusEvent {
    KnobsConnecting { target: String },
    KnobsConnected { target: String, peer: String },
    /// A receive landed `received` bytes in the knob state
    KnobsUpdated { received: usize },
    /// Terminal: the loop ended on peer close or error
    KnobsDisconnected { target: String, reason: String },
    /// Terminal: the loop ended because `stop()` was called
    KnobsStopped { target: String },
}

/// Event bus handle for publishing and subscribing
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: BusEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    /// 256 events; update bursts beyond that lag slow subscribers
    fn default() -> Self {
        Self::new(256)
    }
}

/// Shared event bus wrapped in Arc for thread-safe sharing
pub type SharedBus = Arc<EventBus>;

pub fn create_bus() -> SharedBus {
    Arc::new(EventBus::default())
}
