// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory conversation store.
//!
//! One store holds one viewer's conversations. It is a plain owned value:
//! every writer receives it by `&mut`, so writes cannot interleave and tests
//! can build one in isolation.

use chrono::{DateTime, Utc};

use crate::conversation::{Conversation, Message};

/// Where a send goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// A conversation the server already knows.
    Conversation(String),
    /// The provisional direct conversation with `peer`.
    Provisional { peer: String },
}

/// One viewer's conversations, in server order.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    viewer: String,
    conversations: Vec<Conversation>,
}

impl ConversationStore {
    /// Creates an empty store for `viewer`.
    pub fn new(viewer: impl Into<String>) -> Self {
        ConversationStore {
            viewer: viewer.into(),
            conversations: Vec::new(),
        }
    }

    /// Creates a store seeded with `conversations`.
    pub fn with_conversations(viewer: impl Into<String>, conversations: Vec<Conversation>) -> Self {
        ConversationStore {
            viewer: viewer.into(),
            conversations,
        }
    }

    /// The user whose view this store holds.
    pub fn viewer(&self) -> &str {
        &self.viewer
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Returns the conversation with server id `id`.
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.has_id(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.has_id(id))
    }

    /// Returns the conversation a target points at.
    pub fn resolve(&self, target: &Target) -> Option<&Conversation> {
        match target {
            Target::Conversation(id) => self.get(id),
            Target::Provisional { peer } => self.provisional(peer),
        }
    }

    pub fn resolve_mut(&mut self, target: &Target) -> Option<&mut Conversation> {
        match target {
            Target::Conversation(id) => self.get_mut(id),
            Target::Provisional { peer } => {
                let viewer = &self.viewer;
                self.conversations
                    .iter_mut()
                    .find(|c| c.is_provisional() && c.is_direct_with(viewer, peer))
            }
        }
    }

    /// Returns the provisional conversation with `peer`, if any.
    pub fn provisional(&self, peer: &str) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|c| c.is_provisional() && c.is_direct_with(&self.viewer, peer))
    }

    /// Returns the target to use for writing to `peer` directly.
    ///
    /// An existing direct conversation is reused. Otherwise a provisional
    /// one is created, at most one per peer.
    pub fn open_direct(&mut self, peer: &str, now: DateTime<Utc>) -> Target {
        let existing = self.conversations.iter().find(|c| {
            !c.is_provisional() && c.is_direct_with(&self.viewer, peer)
        });
        if let Some(id) = existing.and_then(|c| c.id.clone()) {
            return Target::Conversation(id);
        }
        if self.provisional(peer).is_none() {
            let conv = Conversation::provisional(self.viewer.clone(), peer, now);
            self.conversations.insert(0, conv);
        }
        Target::Provisional {
            peer: peer.to_string(),
        }
    }

    /// Replaces the store with an authoritative conversation list.
    ///
    /// Local sends that are pending or failed survive the refresh, and so do
    /// provisional conversations the server does not know yet.
    pub fn replace_all(&mut self, fetched: Vec<Conversation>) {
        let mut previous = std::mem::take(&mut self.conversations);
        self.conversations = fetched;

        for prev in previous.iter_mut().filter(|c| !c.is_provisional()) {
            let pending = take_pending(prev);
            if pending.is_empty() {
                continue;
            }
            if let Some(id) = prev.id.clone() {
                if let Some(conv) = self.get_mut(&id) {
                    conv.messages.extend(pending);
                }
            }
        }

        for prov in previous.into_iter().filter(Conversation::is_provisional) {
            let Some(peer) = prov.peer_of(&self.viewer).map(str::to_string) else {
                continue;
            };
            let created = self
                .conversations
                .iter()
                .position(|c| !c.is_provisional() && c.is_direct_with(&self.viewer, &peer));
            match created {
                Some(index) => adopt_messages(&mut self.conversations[index], prov.messages),
                None => self.conversations.push(prov),
            }
        }
    }

    /// Fills the provisional conversation with `peer` from the conversation
    /// the server created for it.
    ///
    /// The provisional record is mutated in place and keeps its local
    /// messages. If the created conversation already reached the store
    /// through a refresh, the local messages move there instead.
    pub fn promote(&mut self, peer: &str, created: Conversation) -> Option<String> {
        let id = created.id.clone()?;
        let viewer = self.viewer.clone();
        let prov_index = self
            .conversations
            .iter()
            .position(|c| c.is_provisional() && c.is_direct_with(&viewer, peer));

        if self.get(&id).is_some() {
            if let Some(index) = prov_index {
                let prov = self.conversations.remove(index);
                if let Some(conv) = self.get_mut(&id) {
                    adopt_messages(conv, prov.messages);
                }
            }
            return Some(id);
        }

        match prov_index {
            Some(index) => {
                let conv = &mut self.conversations[index];
                conv.id = Some(id.clone());
                conv.name = created.name;
                conv.members = created.members;
                conv.last_active = created.last_active;
                conv.created_at = created.created_at;
                conv.creator_id = created.creator_id;
                for msg in conv.messages.iter_mut() {
                    msg.chat_id = id.clone();
                }
                conv.messages.extend(created.messages);
            }
            None => self.conversations.insert(0, created),
        }
        Some(id)
    }

    /// Returns the local send identified by `local_id`.
    pub fn pending_mut(&mut self, local_id: &str) -> Option<&mut Message> {
        self.conversations
            .iter_mut()
            .flat_map(|c| c.messages.iter_mut())
            .find(|m| m.local_id.as_deref() == Some(local_id))
    }

    /// Removes the local send identified by `local_id`.
    pub fn remove_pending(&mut self, local_id: &str) -> Option<Message> {
        for conv in self.conversations.iter_mut() {
            if let Some(index) = conv
                .messages
                .iter()
                .position(|m| m.local_id.as_deref() == Some(local_id))
            {
                return Some(conv.messages.remove(index));
            }
        }
        None
    }

    /// Returns the message with server id `message_id` in conversation `chat_id`.
    pub fn message_mut(&mut self, chat_id: &str, message_id: &str) -> Option<&mut Message> {
        self.get_mut(chat_id)?
            .messages
            .iter_mut()
            .find(|m| m.same_server_id(message_id))
    }

    pub fn message(&self, chat_id: &str, message_id: &str) -> Option<&Message> {
        self.get(chat_id)?
            .messages
            .iter()
            .find(|m| m.same_server_id(message_id))
    }
}

fn take_pending(conv: &mut Conversation) -> Vec<Message> {
    let (pending, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut conv.messages)
        .into_iter()
        .partition(Message::is_pending);
    conv.messages = kept;
    pending
}

fn adopt_messages(conv: &mut Conversation, messages: Vec<Message>) {
    let Some(id) = conv.id.clone() else {
        return;
    };
    for mut msg in messages.into_iter().filter(Message::is_pending) {
        msg.chat_id = id.clone();
        conv.messages.push(msg);
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
