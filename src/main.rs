//! Knob Monitor
//!
//! Connects to the knob server and prints every knob's normalized value as
//! updates arrive. On Ctrl+C, SIGTERM or when the stream ends, prints the
//! final knob table and connection status.

use knob_client::bus::{self, BusEvent};
use knob_client::{config, KnobReader, KnobSnapshot, Startable};

use anyhow::Result;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knob_client=debug,knob_monitor=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting knob monitor v{} ({})",
        env!("KNOBS_VERSION"),
        env!("KNOBS_GIT_SHA")
    );

    let config = config::load_config()?;
    tracing::info!(
        "Configuration loaded, target: {}, knobs: {}",
        config.target(),
        config.num_knobs
    );

    let bus = bus::create_bus();
    let mut events = bus.subscribe();
    let reader = KnobReader::new(config, bus);
    let mut knobs = reader.state().subscribe();

    reader.start().await?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = knobs.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = knobs.borrow_and_update().clone();
                print_knobs(&snapshot);
            }
            event = events.recv() => match event {
                Ok(BusEvent::KnobsDisconnected { reason, .. }) => {
                    tracing::info!("Knob stream ended: {}", reason);
                    break;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Monitor skipped {} bus events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => break,
        }
    }

    reader.stop().await;

    println!("\nFinal knob values:\n{}", reader.snapshot());
    let status = reader.status().await;
    println!("\n{}", serde_json::to_string_pretty(&status)?);

    Ok(())
}

/// One `index:\tvalue` line per knob
fn print_knobs(snapshot: &KnobSnapshot) {
    let lines: Vec<String> = snapshot
        .normalized()
        .iter()
        .enumerate()
        .map(|(i, value)| format!("{}:\t{}", i, value))
        .collect();
    println!("\n{}", lines.join("\n"));
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
