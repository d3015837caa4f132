use async_trait::async_trait;

use crate::error::Result;

/// Uniform start/stop for background components.
#[async_trait]
pub trait Startable: Send + Sync {
    /// Component name used in logs (e.g. "knobs")
    fn name(&self) -> &'static str;

    /// Start the component. No-op if already running.
    async fn start(&self) -> Result<()>;

    /// Stop the component gracefully. No-op if not running.
    async fn stop(&self);

    async fn is_running(&self) -> bool;
}
