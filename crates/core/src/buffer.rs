// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Accumulated output of one AI stream.
//!
//! A buffer is never part of message history. Callers that want to keep the
//! result turn it into a message with [`StreamBuffer::into_message`].

use chrono::{DateTime, Utc};

use crate::conversation::{Message, PLACEHOLDER_ID};
use crate::protocol::{StreamChunk, StreamKind};

/// Lifecycle of a stream buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Completed,
    /// Terminated by an error frame or a lost connection.
    Failed(String),
}

/// What applying a chunk produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEffect {
    /// A fragment was appended.
    Fragment(String),
    Completed,
    Failed(String),
    /// The buffer was already terminal; the chunk was dropped.
    Ignored,
}

/// Fragments of one stream, keyed by conversation and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBuffer {
    chat_id: Option<String>,
    kind: StreamKind,
    text: String,
    state: StreamState,
}

impl StreamBuffer {
    pub fn new(chat_id: Option<String>, kind: StreamKind) -> Self {
        StreamBuffer {
            chat_id,
            kind,
            text: String::new(),
            state: StreamState::Streaming,
        }
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Fragments received so far, concatenated in arrival order.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state != StreamState::Streaming
    }

    /// Applies one frame.
    ///
    /// Once the buffer is terminal further frames are ignored.
    pub fn apply(&mut self, chunk: StreamChunk) -> ChunkEffect {
        if self.is_terminal() {
            return ChunkEffect::Ignored;
        }
        if chunk.is_error() {
            self.state = StreamState::Failed(chunk.response.clone());
            return ChunkEffect::Failed(chunk.response);
        }
        if chunk.done {
            self.state = StreamState::Completed;
            return ChunkEffect::Completed;
        }
        self.text.push_str(&chunk.response);
        ChunkEffect::Fragment(chunk.response)
    }

    /// Marks the stream failed unless it already finished.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.is_terminal() {
            self.state = StreamState::Failed(reason.into());
        }
    }

    /// Turns a completed buffer into an unsent message authored by `sender`.
    ///
    /// Returns `None` for a buffer without a conversation or one that did not
    /// complete.
    pub fn into_message(self, sender: impl Into<String>, now: DateTime<Utc>) -> Option<Message> {
        if self.state != StreamState::Completed {
            return None;
        }
        Some(Message {
            id: PLACEHOLDER_ID.to_string(),
            chat_id: self.chat_id?,
            sender: sender.into(),
            content: self.text,
            command: None,
            media: Vec::new(),
            reply_to: None,
            deleted: false,
            read: true,
            timestamp: now,
            sending: false,
            failure: None,
            local_id: None,
        })
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
