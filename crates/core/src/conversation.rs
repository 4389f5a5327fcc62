// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conversations and messages as the client sees them.
//!
//! A conversation without an identifier is *provisional*: it exists only
//! locally until the first send creates it on the server. A message whose
//! identifier is [`PLACEHOLDER_ID`] has not been assigned an id by the server
//! yet and must never be matched against another placeholder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier the server has not assigned yet.
pub const PLACEHOLDER_ID: &str = "-1";

/// A conversation (direct or group) and the messages loaded for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Server identifier. `None` for a provisional conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name ("Direct Chat" for direct conversations).
    pub name: String,
    /// Participant identifiers, in server order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub members: Vec<String>,
    /// Messages in arrival order (not necessarily timestamp order).
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
    /// Last time anything happened in this conversation.
    pub last_active: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
}

/// Name the gateway gives to two-party conversations.
pub const DIRECT_CHAT_NAME: &str = "Direct Chat";

impl Conversation {
    /// Creates a provisional direct conversation between `viewer` and `peer`.
    pub fn provisional(viewer: impl Into<String>, peer: impl Into<String>, now: DateTime<Utc>) -> Self {
        Conversation {
            id: None,
            name: DIRECT_CHAT_NAME.to_string(),
            members: vec![viewer.into(), peer.into()],
            messages: Vec::new(),
            last_active: now,
            created_at: None,
            creator_id: None,
        }
    }

    /// Returns true if the server has not created this conversation yet.
    pub fn is_provisional(&self) -> bool {
        self.id.is_none()
    }

    /// Returns true if `id` identifies this conversation.
    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    /// Returns the first member that is not the viewer.
    pub fn peer_of(&self, viewer: &str) -> Option<&str> {
        self.members.iter().map(String::as_str).find(|m| *m != viewer)
    }

    /// Returns true if this is a two-party conversation containing `peer`.
    pub fn is_direct_with(&self, viewer: &str, peer: &str) -> bool {
        self.members.len() == 2
            && self.members.iter().any(|m| m == viewer)
            && self.members.iter().any(|m| m == peer)
    }

    /// Number of messages from other members the viewer has not read.
    pub fn unread_count(&self, viewer: &str) -> usize {
        self.messages.iter().filter(|m| m.sender != viewer && !m.read).count()
    }

    /// Number of messages the server already knows about.
    ///
    /// Pending and failed local sends are excluded, so the count can be used
    /// as a paging offset.
    pub fn confirmed_count(&self) -> usize {
        self.messages.iter().filter(|m| !m.is_placeholder()).count()
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// A single message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Server identifier, or [`PLACEHOLDER_ID`] while unconfirmed.
    pub id: String,
    /// Owning conversation.
    pub chat_id: String,
    /// Sender identifier.
    pub sender: String,
    /// Text content. Cleared on soft delete.
    #[serde(default)]
    pub content: String,
    /// Slash-command name (`guess`, ...). Empty on the wire means none.
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub command: Option<String>,
    /// Media references usable in a retrieval URL.
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: Vec<String>,
    /// Message this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub read: bool,
    pub timestamp: DateTime<Utc>,

    /// True only while a local send awaits confirmation.
    #[serde(skip)]
    pub sending: bool,
    /// Why a local send was rejected. The record is kept so it can be retried.
    #[serde(skip)]
    pub failure: Option<String>,
    /// Client-generated token identifying a local send.
    #[serde(skip)]
    pub local_id: Option<String>,
}

impl Message {
    /// Builds the pending record rendered while a send is in flight.
    pub fn pending(
        local_id: impl Into<String>,
        chat_id: impl Into<String>,
        sender: impl Into<String>,
        draft: &MessageDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Message {
            id: PLACEHOLDER_ID.to_string(),
            chat_id: chat_id.into(),
            sender: sender.into(),
            content: draft.content.clone(),
            command: draft.command.clone(),
            media: draft.media.clone(),
            reply_to: draft.reply_to.clone(),
            deleted: false,
            read: false,
            timestamp: now,
            sending: true,
            failure: None,
            local_id: Some(local_id.into()),
        }
    }

    /// Returns true if the server has not assigned an identifier yet.
    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_ID
    }

    /// Returns true for a local send that is in flight or was rejected.
    pub fn is_pending(&self) -> bool {
        self.local_id.is_some() && self.is_placeholder()
    }

    /// Returns true if this record and `other` are the same server message.
    ///
    /// Placeholder ids never match, not even each other.
    pub fn same_server_id(&self, other_id: &str) -> bool {
        !self.is_placeholder() && other_id != PLACEHOLDER_ID && self.id == other_id
    }

    /// Marks the message deleted and clears its content.
    pub fn soft_delete(&mut self) {
        self.deleted = true;
        self.content.clear();
    }
}

/// What the user typed when submitting a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageDraft {
    #[serde(rename = "message")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl MessageDraft {
    /// Creates a plain text draft.
    pub fn text(content: impl Into<String>) -> Self {
        MessageDraft {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_media(mut self, media: Vec<String>) -> Self {
        self.media = media;
        self
    }

    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }

    /// A draft with neither text nor media is not worth sending.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.media.is_empty()
    }
}

/// Viewer profile fields the gateway lets a user change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Media reference of the profile picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
