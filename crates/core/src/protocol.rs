// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket frames exchanged with the gateway.
//!
//! Two kinds of connection exist:
//! - The push channel: the server pushes message objects (new messages, edits,
//!   soft deletes) or `{"error": ...}` objects; the client sends edit frames.
//! - AI streams: one short-lived connection per request. The client sends one
//!   payload on open, the server answers with a sequence of chunks ending in a
//!   chunk with `done = true`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conversation::{Conversation, Message};
use crate::error::{Error, Result};

/// A frame pushed by the server on the push channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PushFrame {
    /// The server rejected something the client did.
    Error {
        /// Human-readable error description.
        error: String,
    },
    /// A new or updated message.
    Message(Message),
}

impl PushFrame {
    /// Creates an Error frame.
    pub fn error(error: impl Into<String>) -> Self {
        PushFrame::Error { error: error.into() }
    }

    /// Creates a Message frame.
    pub fn message(message: Message) -> Self {
        PushFrame::Message(message)
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// A frame sent by the client on the push channel to edit or delete a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditFrame {
    pub content: String,
    pub chat_id: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
}

impl EditFrame {
    /// Creates a frame replacing the content of `message`.
    pub fn edit(message: &Message, content: impl Into<String>) -> Self {
        EditFrame {
            content: content.into(),
            chat_id: message.chat_id.clone(),
            id: message.id.clone(),
            deleted: false,
        }
    }

    /// Creates a frame soft-deleting `message`.
    pub fn delete(message: &Message) -> Self {
        EditFrame {
            content: message.content.clone(),
            chat_id: message.chat_id.clone(),
            id: message.id.clone(),
            deleted: true,
        }
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// The AI request kinds, each served on its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Summarization,
    Rewrite,
    Fix,
}

impl StreamKind {
    /// Endpoint path segment below the AI base URL.
    pub fn path(&self) -> &'static str {
        match self {
            StreamKind::Summarization => "summarization",
            StreamKind::Rewrite => "rewrite",
            StreamKind::Fix => "fix",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for StreamKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "summarization" | "summary" => Ok(StreamKind::Summarization),
            "rewrite" => Ok(StreamKind::Rewrite),
            "fix" => Ok(StreamKind::Fix),
            other => Err(Error::InvalidStreamKind(other.to_string())),
        }
    }
}

/// The single payload a client sends when an AI stream opens.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StreamRequest {
    /// Summarize a whole conversation.
    Conversation(Conversation),
    /// Rewrite or fix a piece of text.
    Text { text: String },
}

impl StreamRequest {
    pub fn text(text: impl Into<String>) -> Self {
        StreamRequest::Text { text: text.into() }
    }

    /// Returns the kinds this payload is valid for.
    pub fn accepts(&self, kind: StreamKind) -> bool {
        matches!(
            (self, kind),
            (StreamRequest::Conversation(_), StreamKind::Summarization)
                | (StreamRequest::Text { .. }, StreamKind::Rewrite | StreamKind::Fix)
        )
    }

    /// Serializes the payload to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// `done_reason` value that marks a failed stream.
pub const DONE_REASON_ERROR: &str = "error";

/// One frame of an AI stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamChunk {
    pub done: bool,
    #[serde(default)]
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_reason: Option<String>,
}

impl StreamChunk {
    /// Creates a text fragment.
    pub fn fragment(text: impl Into<String>) -> Self {
        StreamChunk {
            done: false,
            response: text.into(),
            done_reason: None,
        }
    }

    /// Creates the terminal chunk of a successful stream.
    pub fn finished() -> Self {
        StreamChunk {
            done: true,
            response: String::new(),
            done_reason: Some("stop".to_string()),
        }
    }

    /// Creates the terminal chunk of a failed stream.
    pub fn failed(message: impl Into<String>) -> Self {
        StreamChunk {
            done: true,
            response: message.into(),
            done_reason: Some(DONE_REASON_ERROR.to_string()),
        }
    }

    /// Returns true if this chunk reports a failure.
    pub fn is_error(&self) -> bool {
        self.done_reason.as_deref() == Some(DONE_REASON_ERROR)
    }

    /// Serializes the chunk to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes the chunk from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
