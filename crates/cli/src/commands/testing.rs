// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by command tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use chrono::{TimeZone, Utc};
use commz_core::{Conversation, Message, DIRECT_CHAT_NAME};
use commz_sync::transport::TransportResult;
use commz_sync::{Transport, TransportError};

pub fn message(id: &str, chat_id: &str, sender: &str, content: &str) -> Message {
    Message {
        id: id.into(),
        chat_id: chat_id.into(),
        sender: sender.into(),
        content: content.into(),
        command: None,
        media: Vec::new(),
        reply_to: None,
        deleted: false,
        read: false,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 4, 9, 5, 0).unwrap(),
        sending: false,
        failure: None,
        local_id: None,
    }
}

pub fn conversation(id: &str, members: &[&str]) -> Conversation {
    Conversation {
        id: Some(id.into()),
        name: DIRECT_CHAT_NAME.into(),
        members: members.iter().map(|m| m.to_string()).collect(),
        messages: Vec::new(),
        last_active: Utc.with_ymd_and_hms(2026, 3, 4, 9, 5, 0).unwrap(),
        created_at: None,
        creator_id: None,
    }
}

/// Transport that replays fixed frames, or refuses to connect.
pub struct ScriptedTransport {
    frames: VecDeque<String>,
    refuse: bool,
    connected: bool,
}

impl ScriptedTransport {
    pub fn replaying(frames: &[&str]) -> Self {
        ScriptedTransport {
            frames: frames.iter().map(|f| f.to_string()).collect(),
            refuse: false,
            connected: false,
        }
    }

    pub fn refusing() -> Self {
        ScriptedTransport {
            frames: VecDeque::new(),
            refuse: true,
            connected: false,
        }
    }
}

impl Transport for ScriptedTransport {
    fn connect(
        &mut self,
        _url: &str,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if self.refuse {
                return Err(TransportError::ConnectionFailed("refused".into()));
            }
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(
        &mut self,
        _text: String,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<String>>> + Send + '_>> {
        Box::pin(async move { Ok(self.frames.pop_front()) })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
