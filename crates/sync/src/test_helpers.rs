// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use commz_core::{Conversation, Message, DIRECT_CHAT_NAME};

use crate::timer::Timer;
use crate::transport::{Transport, TransportError, TransportResult};

/// How a scripted connection ends once its frames are used up.
#[derive(Debug, Clone)]
pub enum SessionEnd {
    /// The server closes the connection.
    Close,
    /// The connection stays open and silent.
    Hold,
    /// The connection breaks with a receive error.
    Error(String),
}

/// One scripted connection.
#[derive(Debug, Clone)]
pub enum MockSession {
    Refuse,
    Open {
        frames: Vec<String>,
        end: SessionEnd,
    },
}

impl MockSession {
    pub fn closing(frames: Vec<String>) -> Self {
        MockSession::Open {
            frames,
            end: SessionEnd::Close,
        }
    }

    pub fn holding(frames: Vec<String>) -> Self {
        MockSession::Open {
            frames,
            end: SessionEnd::Hold,
        }
    }

    pub fn failing(frames: Vec<String>, error: &str) -> Self {
        MockSession::Open {
            frames,
            end: SessionEnd::Error(error.to_string()),
        }
    }
}

/// Server side of the mock: scripts connections and records traffic.
///
/// When the script runs out, further connections hold open silently.
#[derive(Default)]
pub struct MockRemote {
    sessions: Mutex<VecDeque<MockSession>>,
    sent: Mutex<Vec<String>>,
    urls: Mutex<Vec<String>>,
    connects: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(MockRemote::default())
    }

    pub fn script(&self, session: MockSession) {
        self.sessions.lock().unwrap().push_back(session);
    }

    /// Frames the client sent, across all connections.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// URLs of every connect attempt.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    /// Number of connect attempts, refused ones included.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn transport(self: &Arc<Self>) -> MockTransport {
        MockTransport {
            remote: Arc::clone(self),
            connected: false,
            frames: VecDeque::new(),
            end: SessionEnd::Hold,
        }
    }
}

/// Mock transport for testing without real sockets.
pub struct MockTransport {
    remote: Arc<MockRemote>,
    connected: bool,
    frames: VecDeque<String>,
    end: SessionEnd,
}

impl Transport for MockTransport {
    fn connect(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let url = url.to_string();
        Box::pin(async move {
            self.remote.connects.fetch_add(1, Ordering::SeqCst);
            self.remote.urls.lock().unwrap().push(url);
            let next = self
                .remote
                .sessions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| MockSession::holding(Vec::new()));
            match next {
                MockSession::Refuse => {
                    Err(TransportError::ConnectionFailed("mock refused".into()))
                }
                MockSession::Open { frames, end } => {
                    self.connected = true;
                    self.frames = frames.into();
                    self.end = end;
                    Ok(())
                }
            }
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.connected = false;
            self.frames.clear();
            Ok(())
        })
    }

    fn send(
        &mut self,
        text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            self.remote.sent.lock().unwrap().push(text);
            Ok(())
        })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            if let Some(frame) = self.frames.pop_front() {
                return Ok(Some(frame));
            }
            match self.end.clone() {
                SessionEnd::Close => {
                    self.connected = false;
                    Ok(None)
                }
                SessionEnd::Error(e) => {
                    self.connected = false;
                    Err(TransportError::ReceiveFailed(e))
                }
                SessionEnd::Hold => {
                    std::future::pending::<()>().await;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Timer that records requested delays and resolves at once.
#[derive(Clone, Default)]
pub struct RecordingTimer {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingTimer {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Timer for RecordingTimer {
    fn sleep(&self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.delays.lock().unwrap().push(duration);
        Box::pin(tokio::task::yield_now())
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// A message from `sender` in conversation `chat_id`.
pub fn message(id: &str, chat_id: &str, sender: &str) -> Message {
    Message {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender: sender.to_string(),
        content: format!("message {id}"),
        command: None,
        media: Vec::new(),
        reply_to: None,
        deleted: false,
        read: false,
        timestamp: at(100),
        sending: false,
        failure: None,
        local_id: None,
    }
}

/// A direct conversation between `members`.
pub fn conversation(id: &str, members: &[&str]) -> Conversation {
    Conversation {
        id: Some(id.to_string()),
        name: DIRECT_CHAT_NAME.to_string(),
        members: members.iter().map(|m| m.to_string()).collect(),
        messages: Vec::new(),
        last_active: at(0),
        created_at: None,
        creator_id: None,
    }
}

/// Serializes `msg` as the push channel would deliver it.
pub fn push_json(msg: &Message) -> String {
    serde_json::to_string(msg).unwrap()
}
