// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent push channel.
//!
//! One background task owns the transport. It connects, forwards decoded
//! frames to the event receiver and writes outbound frames, and when the
//! connection closes for any reason it waits a constant delay and connects
//! again. There is no backoff growth and no retry limit.
//!
//! ```text
//! ┌───────────────┐  outbound  ┌─────────────┐   ws   ┌─────────┐
//! │ ChannelHandle │───────────►│ worker task │◄──────►│ gateway │
//! └───────────────┘            └─────────────┘        └─────────┘
//!                                     │ ChannelEvent
//!                                     ▼
//!                               session loop
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use commz_core::{EditFrame, PushFrame};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::timer::Timer;
use crate::transport::{Transport, TransportResult};

/// Connection state values for atomic state field.
pub const STATE_DISCONNECTED: u8 = 0;
pub const STATE_CONNECTING: u8 = 1;
pub const STATE_CONNECTED: u8 = 2;

/// Default wait between a close and the next connect.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Connection state visible to both the worker task and callers.
///
/// Uses atomic fields for lock-free reads.
pub struct SharedChannelState {
    state: AtomicU8,
    /// Connect attempts since the channel was created.
    attempts: AtomicU32,
}

impl SharedChannelState {
    /// Create a new shared state initialized to disconnected.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_DISCONNECTED),
            attempts: AtomicU32::new(0),
        }
    }

    /// Get the current state.
    pub fn get(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    fn set(&self, state: u8) {
        self.state.store(state, Ordering::Release);
    }

    fn begin_attempt(&self) -> u32 {
        self.set(STATE_CONNECTING);
        self.attempts.fetch_add(1, Ordering::AcqRel).saturating_add(1)
    }

    /// Total connect attempts so far.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }

    pub fn is_connected(&self) -> bool {
        self.get() == STATE_CONNECTED
    }

    pub fn is_connecting(&self) -> bool {
        self.get() == STATE_CONNECTING
    }

    /// Get a human-readable status string.
    pub fn status_string(&self) -> String {
        match self.get() {
            STATE_DISCONNECTED => "disconnected".to_string(),
            STATE_CONNECTING => format!("connecting (attempt {})", self.attempts()),
            STATE_CONNECTED => "connected".to_string(),
            _ => "unknown".to_string(),
        }
    }
}

impl Default for SharedChannelState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events sent from the worker task to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A connection is open.
    Connected,
    /// A decoded frame arrived.
    Frame(PushFrame),
    /// The connection closed or could not be opened. A reconnect follows.
    Closed {
        /// Why, when known.
        reason: Option<String>,
    },
}

/// Configuration for the push channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// URL to connect to.
    pub url: String,
    /// Constant wait before every reconnect.
    pub reconnect_delay: Duration,
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        ChannelConfig {
            url: url.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

type Worker = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Handle to the push channel.
///
/// Cloning the handle is cheap; every clone drives the same connection.
#[derive(Clone)]
pub struct ChannelHandle {
    shared: Arc<SharedChannelState>,
    outbound: mpsc::UnboundedSender<String>,
    cancel_token: CancellationToken,
    /// The worker, until the first `connect` starts it.
    worker: Arc<Mutex<Option<Worker>>>,
}

impl ChannelHandle {
    /// Create a channel over `transport`.
    ///
    /// Returns the handle and a receiver for channel events. Nothing connects
    /// until [`ChannelHandle::connect`] is called.
    pub fn new<T, M>(
        transport: T,
        timer: M,
        config: ChannelConfig,
    ) -> (Self, mpsc::Receiver<ChannelEvent>)
    where
        T: Transport + 'static,
        M: Timer + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(64);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(SharedChannelState::new());
        let cancel_token = CancellationToken::new();

        let worker: Worker = Box::pin(run_channel(
            transport,
            timer,
            config,
            Arc::clone(&shared),
            event_tx,
            outbound_rx,
            cancel_token.clone(),
        ));

        let handle = ChannelHandle {
            shared,
            outbound: outbound_tx,
            cancel_token,
            worker: Arc::new(Mutex::new(Some(worker))),
        };
        (handle, event_rx)
    }

    /// Starts the connection task.
    ///
    /// Does nothing when a connection is already open or an attempt is in
    /// flight. Returns true if this call started the task.
    pub fn connect(&self) -> bool {
        if self.shared.is_connected() || self.shared.is_connecting() {
            debug!("push channel connect skipped, already {}", self.shared.status_string());
            return false;
        }
        let worker = match self.worker.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        match worker {
            Some(worker) => {
                tokio::spawn(worker);
                true
            }
            None => {
                debug!("push channel connect skipped, task already running");
                false
            }
        }
    }

    /// Sends an edit or delete frame.
    ///
    /// Fails silently when no connection is open.
    pub fn send(&self, frame: &EditFrame) {
        if !self.shared.is_connected() {
            debug!(id = %frame.id, "push channel not connected, dropping frame");
            return;
        }
        match frame.to_json() {
            Ok(json) => {
                let _ = self.outbound.send(json);
            }
            Err(e) => warn!("failed to encode push frame: {}", e),
        }
    }

    /// Stops the connection task. The channel does not reconnect afterwards.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    pub fn state(&self) -> &SharedChannelState {
        &self.shared
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }
}

/// Why a connected session ended.
enum SessionExit {
    Closed(Option<String>),
    Stopped,
}

enum Step {
    Inbound(TransportResult<Option<String>>),
    Outbound(Option<String>),
    Cancelled,
}

/// Worker task: connect, pump, wait, repeat.
async fn run_channel<T: Transport, M: Timer>(
    mut transport: T,
    timer: M,
    config: ChannelConfig,
    shared: Arc<SharedChannelState>,
    event_tx: mpsc::Sender<ChannelEvent>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    cancel_token: CancellationToken,
) {
    loop {
        if cancel_token.is_cancelled() {
            break;
        }

        let attempt = shared.begin_attempt();
        let connect_result = tokio::select! {
            _ = cancel_token.cancelled() => break,
            result = transport.connect(&config.url) => result,
        };

        let reason = match connect_result {
            Ok(()) => {
                shared.set(STATE_CONNECTED);
                info!(url = %config.url, attempt, "push channel connected");
                // Frames queued while disconnected are dropped, not replayed
                while outbound_rx.try_recv().is_ok() {}
                if event_tx.send(ChannelEvent::Connected).await.is_err() {
                    break;
                }
                let exit = pump(
                    &mut transport,
                    &event_tx,
                    &mut outbound_rx,
                    &cancel_token,
                )
                .await;
                let _ = transport.disconnect().await;
                match exit {
                    SessionExit::Closed(reason) => reason,
                    SessionExit::Stopped => break,
                }
            }
            Err(e) => Some(e.to_string()),
        };

        shared.set(STATE_DISCONNECTED);
        warn!(
            url = %config.url,
            reason = reason.as_deref().unwrap_or("closed by server"),
            "push channel lost, reconnecting in {:?}",
            config.reconnect_delay
        );
        if event_tx.send(ChannelEvent::Closed { reason }).await.is_err() {
            break;
        }

        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = timer.sleep(config.reconnect_delay) => {}
        }
    }
    shared.set(STATE_DISCONNECTED);
    debug!("push channel task stopped");
}

/// Moves frames in both directions until the connection ends.
async fn pump<T: Transport>(
    transport: &mut T,
    event_tx: &mpsc::Sender<ChannelEvent>,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    cancel_token: &CancellationToken,
) -> SessionExit {
    loop {
        let step = tokio::select! {
            _ = cancel_token.cancelled() => Step::Cancelled,
            inbound = transport.recv() => Step::Inbound(inbound),
            outbound = outbound_rx.recv() => Step::Outbound(outbound),
        };

        match step {
            Step::Cancelled => return SessionExit::Stopped,
            Step::Inbound(Ok(Some(text))) => match PushFrame::from_json(&text) {
                Ok(frame) => {
                    debug!("push frame received");
                    if event_tx.send(ChannelEvent::Frame(frame)).await.is_err() {
                        return SessionExit::Stopped;
                    }
                }
                Err(e) => warn!("dropping undecodable push frame: {}", e),
            },
            Step::Inbound(Ok(None)) => return SessionExit::Closed(None),
            Step::Inbound(Err(e)) => return SessionExit::Closed(Some(e.to_string())),
            Step::Outbound(Some(text)) => {
                if let Err(e) = transport.send(text).await {
                    return SessionExit::Closed(Some(e.to_string()));
                }
            }
            // Every handle is gone, nobody can send or listen any more
            Step::Outbound(None) => return SessionExit::Stopped,
        }
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
