//! Latest-value cache for knob positions
//!
//! One writer (the receive task), any number of readers on any thread. The
//! whole array lives in a `watch` cell so a reader always sees every slot
//! from the same receive, and readers do not need a runtime.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use super::normalize::lerp_range;
use crate::error::{KnobError, Result};

/// Rows per column in the console table
const TABLE_ROWS: usize = 16;

/// Raw knob values captured at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnobSnapshot {
    values: Vec<u8>,
}

impl KnobSnapshot {
    pub fn zeroed(num_knobs: usize) -> Self {
        Self {
            values: vec![0; num_knobs],
        }
    }

    pub fn from_raw(values: Vec<u8>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.values
    }

    pub fn raw(&self, index: usize) -> Result<u8> {
        self.values
            .get(index)
            .copied()
            .ok_or(KnobError::IndexOutOfRange {
                index,
                len: self.values.len(),
            })
    }

    /// Value in `[0, 1]`
    pub fn get(&self, index: usize) -> Result<f32> {
        self.get_range(index, 0.0, 1.0)
    }

    /// Value in `[0, max]`
    pub fn get_max(&self, index: usize, max: f32) -> Result<f32> {
        self.get_range(index, 0.0, max)
    }

    /// Value in `[min, max]`, see [`lerp_range`]
    pub fn get_range(&self, index: usize, min: f32, max: f32) -> Result<f32> {
        Ok(lerp_range(self.raw(index)?, min, max))
    }

    /// Every knob in `[0, 1]`, by index
    pub fn normalized(&self) -> Vec<f32> {
        self.values
            .iter()
            .map(|&raw| lerp_range(raw, 0.0, 1.0))
            .collect()
    }

    /// Overwrite the leading slots with `received`; trailing slots keep
    /// their previous values. Returns the number of slots written.
    fn overwrite_prefix(&mut self, received: &[u8]) -> usize {
        let n = received.len().min(self.values.len());
        self.values[..n].copy_from_slice(&received[..n]);
        n
    }
}

impl fmt::Display for KnobSnapshot {
    /// `index: value` cells, 16 rows per column, columns tab separated
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<String> = self
            .normalized()
            .iter()
            .enumerate()
            .map(|(i, value)| format!("{:<4}{:10.8}", format!("{}:", i), value))
            .collect();
        let columns = cells.len().div_ceil(TABLE_ROWS);

        for row in 0..cells.len().min(TABLE_ROWS) {
            if row > 0 {
                writeln!(f)?;
            }
            let line: Vec<&str> = (0..columns)
                .filter_map(|col| cells.get(col * TABLE_ROWS + row))
                .map(String::as_str)
                .collect();
            write!(f, "{}", line.join("\t"))?;
        }
        Ok(())
    }
}

/// Shared knob state handle. Cloning shares the same slots.
#[derive(Clone)]
pub struct KnobState {
    tx: Arc<watch::Sender<KnobSnapshot>>,
}

impl KnobState {
    /// All slots start at zero
    pub fn new(num_knobs: usize) -> Self {
        let (tx, _) = watch::channel(KnobSnapshot::zeroed(num_knobs));
        Self { tx: Arc::new(tx) }
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Store one receive's bytes positionally from knob 0.
    ///
    /// Only the bytes actually received are copied; a short receive leaves
    /// the remaining knobs at their previous values.
    pub fn apply(&self, received: &[u8]) -> usize {
        let mut written = 0;
        self.tx.send_modify(|snapshot| {
            written = snapshot.overwrite_prefix(received);
        });
        written
    }

    pub fn raw(&self, index: usize) -> Result<u8> {
        self.tx.borrow().raw(index)
    }

    pub fn get(&self, index: usize) -> Result<f32> {
        self.tx.borrow().get(index)
    }

    pub fn get_max(&self, index: usize, max: f32) -> Result<f32> {
        self.tx.borrow().get_max(index, max)
    }

    pub fn get_range(&self, index: usize, min: f32, max: f32) -> Result<f32> {
        self.tx.borrow().get_range(index, min, max)
    }

    pub fn snapshot(&self) -> KnobSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that wakes on every subsequent `apply`
    pub fn subscribe(&self) -> watch::Receiver<KnobSnapshot> {
        self.tx.subscribe()
    }
}

impl fmt::Debug for KnobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnobState")
            .field("values", &self.tx.borrow().as_bytes())
            .finish()
    }
}
