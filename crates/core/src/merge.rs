// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Merge server messages into the conversation store.
//!
//! Merge rules:
//! - Unknown conversation: nothing is written, the caller refreshes
//! - Same server id already present: overwrite in place
//! - Otherwise: append at the end, in arrival order
//!
//! Placeholder ids never match, so concurrent local sends never collapse.
//! Messages are never sorted by timestamp. Merging the same message twice
//! leaves the store as merging it once.

use crate::conversation::Message;
use crate::store::ConversationStore;

/// What merging a single message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The message belongs to a conversation the store does not hold.
    UnknownConversation(String),
    /// An existing record was overwritten.
    Updated { index: usize },
    /// The message was appended.
    Appended { index: usize },
}

impl MergeOutcome {
    /// Returns true if the store was written.
    pub fn changed(&self) -> bool {
        !matches!(self, MergeOutcome::UnknownConversation(_))
    }
}

/// Trait for reconciling server messages with local state.
pub trait Merge {
    /// Merges one pushed message.
    fn merge_message(&mut self, message: Message) -> MergeOutcome;

    /// Prepends a page of older history for `chat_id`, keeping page order.
    ///
    /// Records whose id is already present are skipped. Returns the number of
    /// records inserted, or `None` if the conversation is unknown.
    fn merge_page(&mut self, chat_id: &str, page: Vec<Message>) -> Option<usize>;

    /// Merges several pushed messages in order.
    fn merge_all(&mut self, messages: Vec<Message>) -> Vec<MergeOutcome> {
        messages.into_iter().map(|m| self.merge_message(m)).collect()
    }
}

impl Merge for ConversationStore {
    fn merge_message(&mut self, message: Message) -> MergeOutcome {
        let Some(conv) = self.get_mut(&message.chat_id) else {
            return MergeOutcome::UnknownConversation(message.chat_id);
        };

        let existing = conv
            .messages
            .iter()
            .position(|m| m.same_server_id(&message.id));

        match existing {
            Some(index) => {
                overwrite(&mut conv.messages[index], message);
                MergeOutcome::Updated { index }
            }
            None => {
                if message.timestamp > conv.last_active {
                    conv.last_active = message.timestamp;
                }
                conv.messages.push(message);
                MergeOutcome::Appended {
                    index: conv.messages.len() - 1,
                }
            }
        }
    }

    fn merge_page(&mut self, chat_id: &str, page: Vec<Message>) -> Option<usize> {
        let conv = self.get_mut(chat_id)?;
        let fresh: Vec<Message> = page
            .into_iter()
            .filter(|p| !conv.messages.iter().any(|m| m.same_server_id(&p.id)))
            .collect();
        let inserted = fresh.len();
        conv.messages.splice(0..0, fresh);
        Some(inserted)
    }
}

/// Replaces the server fields of `record`, keeping its local send token.
fn overwrite(record: &mut Message, incoming: Message) {
    let local_id = record.local_id.take();
    *record = incoming;
    record.local_id = local_id;
    record.sending = false;
    record.failure = None;
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
