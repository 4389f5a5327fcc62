// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read receipts.
//!
//! Viewing an unread message from someone else sends one mark-read request
//! per viewing and flips the local flag right away. A viewing ends when the
//! selection changes.

use std::collections::HashSet;

use commz_core::{ConversationStore, Merge, Message};
use tracing::warn;

use crate::pull::PullResult;
use crate::session::{Effects, Notice, Request};

#[derive(Debug, Default)]
pub struct ReadTracker {
    /// Messages already reported during the current viewing.
    notified: HashSet<(String, String)>,
}

impl ReadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new viewing.
    pub fn reset(&mut self) {
        self.notified.clear();
    }

    /// Records that the viewer saw `message_id` in `chat_id`.
    ///
    /// Returns true if a mark-read request was issued.
    pub fn on_view(
        &mut self,
        store: &mut ConversationStore,
        chat_id: &str,
        message_id: &str,
        effects: &mut Effects,
    ) -> bool {
        let viewer = store.viewer().to_string();
        let Some(message) = store.message_mut(chat_id, message_id) else {
            return false;
        };
        if message.sender == viewer || message.read {
            return false;
        }
        if !self
            .notified
            .insert((chat_id.to_string(), message_id.to_string()))
        {
            return false;
        }

        message.read = true;
        effects.changed();
        effects.request(Request::MarkRead {
            chat_id: chat_id.to_string(),
            message_id: message_id.to_string(),
        });
        true
    }

    /// Applies the answer to a mark-read request.
    pub fn on_marked(
        &mut self,
        store: &mut ConversationStore,
        chat_id: &str,
        message_id: &str,
        result: PullResult<Message>,
        effects: &mut Effects,
    ) {
        match result {
            Ok(updated) => {
                if updated.chat_id == chat_id && store.merge_message(updated).changed() {
                    effects.changed();
                }
            }
            Err(e) => {
                warn!(chat_id, message_id, "mark read failed: {}", e);
                if let Some(message) = store.message_mut(chat_id, message_id) {
                    message.read = false;
                    effects.changed();
                }
                effects.notice(Notice::request("mark read", &e));
            }
        }
    }
}

#[cfg(test)]
#[path = "read_tests.rs"]
mod tests;
