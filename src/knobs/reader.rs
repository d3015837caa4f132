//! KnobReader - public face of the knob client
//!
//! `start()` spawns the receive task and returns at once; `get*` read the
//! latest values from any thread; `stop()` cancels the task, closes the
//! socket and waits for the task to finish.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::receive::{supervise, ReceiveContext};
use super::state::{KnobSnapshot, KnobState};
use super::status::{KnobConnectionStatus, SharedStatus};
use crate::bus::SharedBus;
use crate::config::KnobClientConfig;
use crate::error::{KnobError, Result};
use crate::lifecycle::Startable;

#[derive(Clone)]
pub struct KnobReader {
    config: KnobClientConfig,
    state: KnobState,
    bus: SharedBus,
    status: SharedStatus,
    /// Replaced on every start so a stopped reader can be started again
    shutdown: Arc<RwLock<CancellationToken>>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl KnobReader {
    pub fn new(config: KnobClientConfig, bus: SharedBus) -> Self {
        let state = KnobState::new(config.num_knobs);
        let status = KnobConnectionStatus::new(config.host.clone(), config.port);
        Self {
            config,
            state,
            bus,
            status: Arc::new(RwLock::new(status)),
            shutdown: Arc::new(RwLock::new(CancellationToken::new())),
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &KnobClientConfig {
        &self.config
    }

    /// Cloneable handle on the knob values for render/audio threads
    pub fn state(&self) -> KnobState {
        self.state.clone()
    }

    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    /// Knob value in `[0, 1]`
    pub fn get(&self, index: usize) -> Result<f32> {
        self.state.get(index)
    }

    /// Knob value in `[0, max]`
    pub fn get_max(&self, index: usize, max: f32) -> Result<f32> {
        self.state.get_max(index, max)
    }

    /// Knob value linearly mapped into `[min, max]`, unclamped
    pub fn get_range(&self, index: usize, min: f32, max: f32) -> Result<f32> {
        self.state.get_range(index, min, max)
    }

    pub fn raw(&self, index: usize) -> Result<u8> {
        self.state.raw(index)
    }

    pub fn snapshot(&self) -> KnobSnapshot {
        self.state.snapshot()
    }

    /// Wait for the next receive to land and return the values it produced.
    ///
    /// Each call subscribes afresh, so a receive that lands between two calls
    /// is not reported. Loops that must see every update should hold a
    /// receiver from `state().subscribe()` instead.
    pub async fn changed(&self) -> KnobSnapshot {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self.state`, so this cannot fail
        let _ = rx.changed().await;
        let snapshot = rx.borrow_and_update().clone();
        snapshot
    }

    pub async fn status(&self) -> KnobConnectionStatus {
        self.status.read().await.clone()
    }

    async fn start_internal(&self) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| KnobError::Initialization(e.to_string()))?;
        self.config.validate()?;

        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("{}: knob reader already running", self.config.target());
            return Ok(());
        }

        self.status.write().await.begin_run();

        let shutdown = {
            let mut token = self.shutdown.write().await;
            *token = CancellationToken::new();
            token.clone()
        };

        let ctx = ReceiveContext {
            state: self.state.clone(),
            bus: self.bus.clone(),
            status: self.status.clone(),
            shutdown,
        };

        info!("Starting knob reader for {}", self.config.target());
        *task = Some(runtime.spawn(supervise(self.config.clone(), ctx)));
        Ok(())
    }

    async fn stop_internal(&self) {
        // Hold the task slot while cancelling so a concurrent start cannot
        // swap in a fresh token between the cancel and the join.
        let mut task = self.task.lock().await;
        self.shutdown.read().await.cancel();

        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                warn!("{}: knob reader task ended abnormally: {}", self.config.target(), e);
            }
        }
    }

    async fn is_running_internal(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[async_trait]
impl Startable for KnobReader {
    fn name(&self) -> &'static str {
        "knobs"
    }

    async fn start(&self) -> Result<()> {
        self.start_internal().await
    }

    async fn stop(&self) {
        self.stop_internal().await
    }

    async fn is_running(&self) -> bool {
        self.is_running_internal().await
    }
}
