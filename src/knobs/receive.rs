//! Connect-and-receive lifecycle run by the background task
//!
//! Resolve, connect to the first reachable candidate, then copy each receive
//! into the knob state until the peer closes, the transport errors, or the
//! shutdown token fires. No reconnection: every exit is terminal.

use chrono::Utc;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::state::KnobState;
use super::status::{ConnectionState, SharedStatus};
use crate::bus::{BusEvent, SharedBus};
use crate::config::KnobClientConfig;
use crate::error::{KnobError, Result};

/// How a receive loop ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Zero-byte receive
    PeerClosed,
    /// Shutdown token cancelled
    Stopped,
}

/// Everything the receive task touches
#[derive(Clone)]
pub struct ReceiveContext {
    pub state: KnobState,
    pub bus: SharedBus,
    pub status: SharedStatus,
    pub shutdown: CancellationToken,
}

/// Resolve `host:port` and connect to the first candidate that accepts,
/// trying them in resolution order.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream> {
    let target = format!("{}:{}", host, port);

    let candidates: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|source| KnobError::Resolution {
            target: target.clone(),
            source,
        })?
        .collect();

    if candidates.is_empty() {
        return Err(KnobError::Resolution {
            target,
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        });
    }

    let mut last_error = None;
    for addr in &candidates {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!("{}: connected via {}", target, addr);
                return Ok(stream);
            }
            Err(e) => {
                debug!("{}: connect to {} failed: {}", target, addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(KnobError::Connection {
        target,
        attempted: candidates.len(),
        source: last_error.unwrap_or_else(|| io::Error::other("no candidate attempted")),
    })
}

/// Receive up to one knob array per read until EOF, error or shutdown.
pub async fn receive_loop<R>(reader: &mut R, ctx: &ReceiveContext) -> Result<LoopExit>
where
    R: AsyncRead + Unpin,
{
    if ctx.state.is_empty() {
        return Err(KnobError::InvalidConfig("receive buffer has no knob slots".into()));
    }
    let mut buf = vec![0u8; ctx.state.len()];

    loop {
        let received = tokio::select! {
            _ = ctx.shutdown.cancelled() => return Ok(LoopExit::Stopped),
            read = reader.read(&mut buf) => read.map_err(KnobError::Receive)?,
        };

        if received == 0 {
            return Ok(LoopExit::PeerClosed);
        }

        ctx.state.apply(&buf[..received]);
        trace!("received {} knob byte(s)", received);

        {
            let mut status = ctx.status.write().await;
            status.updates += 1;
            status.last_update = Some(Utc::now());
        }
        ctx.bus.publish(BusEvent::KnobsUpdated { received });
    }
}

/// One full connection lifetime: connect, receive, close the socket.
pub async fn run(config: &KnobClientConfig, ctx: &ReceiveContext) -> Result<LoopExit> {
    let target = config.target();
    ctx.bus.publish(BusEvent::KnobsConnecting {
        target: target.clone(),
    });

    let mut stream = tokio::select! {
        _ = ctx.shutdown.cancelled() => return Ok(LoopExit::Stopped),
        connected = connect(&config.host, config.port) => connected?,
    };

    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| target.clone());
    {
        let mut status = ctx.status.write().await;
        status.state = ConnectionState::Connected;
        status.peer = Some(peer.clone());
    }
    info!("Connected to knob server at {}", peer);
    ctx.bus.publish(BusEvent::KnobsConnected {
        target: target.clone(),
        peer,
    });

    let result = receive_loop(&mut stream, ctx).await;

    if let Err(e) = stream.shutdown().await {
        debug!("{}: socket shutdown: {}", target, e);
    }

    result
}

/// Task body: run once, then record and publish how it ended.
pub async fn supervise(config: KnobClientConfig, ctx: ReceiveContext) {
    let target = config.target();
    let outcome = run(&config, &ctx).await;

    let (state, last_error, event) = match outcome {
        Ok(LoopExit::Stopped) => {
            info!("{}: knob reader stopped", target);
            (
                ConnectionState::Stopped,
                None,
                BusEvent::KnobsStopped {
                    target: target.clone(),
                },
            )
        }
        Ok(LoopExit::PeerClosed) => {
            warn!("{}: connection closed by peer; knob values frozen", target);
            (
                ConnectionState::Closed,
                None,
                BusEvent::KnobsDisconnected {
                    target: target.clone(),
                    reason: "connection closed by peer".to_string(),
                },
            )
        }
        Err(e) => {
            error!("{}: knob reader failed: {}", target, e);
            let reason = e.to_string();
            (
                ConnectionState::Failed,
                Some(reason.clone()),
                BusEvent::KnobsDisconnected {
                    target: target.clone(),
                    reason,
                },
            )
        }
    };

    {
        let mut status = ctx.status.write().await;
        status.state = state;
        status.last_error = last_error;
    }
    ctx.bus.publish(event);
}
