// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Optimistic sends.
//!
//! A submitted draft becomes a pending record in the store right away, with
//! the placeholder id and a fresh local id. The server's answer then fills
//! that record in place, or marks it failed so the user can retry.
//!
//! Sending to a provisional conversation first creates it on the server, and
//! only then posts the message. The two steps are not atomic: if the post
//! fails, the created conversation stays behind empty.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use commz_core::{ConversationStore, Message, MessageDraft, Target};
use tracing::{debug, warn};

use crate::pull::PullResult;
use crate::session::{Effects, Notice, Request, SessionError, SessionEvent};

/// Where a send is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    /// Waiting for the conversation with `peer` to be created.
    AwaitingConversation { peer: String },
    /// The post is in flight.
    Posting,
    /// The server rejected it.
    Failed,
}

#[derive(Debug, Clone)]
struct OutgoingSend {
    draft: MessageDraft,
    stage: Stage,
}

/// Tracks every local send until the server confirms it.
#[derive(Debug, Default)]
pub struct Outbox {
    sends: HashMap<String, OutgoingSend>,
    /// Peers whose conversation is being created.
    creating: HashSet<String>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sends not yet confirmed, failed ones included.
    pub fn len(&self) -> usize {
        self.sends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sends.is_empty()
    }

    /// Records `draft` as a pending send to `target`.
    ///
    /// Returns the local id of the pending record.
    pub fn submit(
        &mut self,
        store: &mut ConversationStore,
        target: &Target,
        draft: MessageDraft,
        now: DateTime<Utc>,
        effects: &mut Effects,
    ) -> Result<String, SessionError> {
        if draft.is_empty() {
            return Err(SessionError::EmptyDraft);
        }
        let viewer = store.viewer().to_string();
        let conv = store
            .resolve_mut(target)
            .ok_or_else(|| SessionError::ConversationNotFound(target_label(target)))?;

        let local_id = uuid::Uuid::new_v4().to_string();
        let chat_id = conv.id.clone().unwrap_or_default();
        conv.messages
            .push(Message::pending(&local_id, &chat_id, viewer, &draft, now));
        conv.last_active = now;
        effects.changed();

        let stage = match target {
            Target::Conversation(_) => {
                effects.request(Request::Send {
                    local_id: local_id.clone(),
                    chat_id,
                    draft: draft.clone(),
                });
                Stage::Posting
            }
            Target::Provisional { peer } => {
                self.request_creation(peer, effects);
                Stage::AwaitingConversation { peer: peer.clone() }
            }
        };
        debug!(local_id = %local_id, "send queued");
        self.sends.insert(local_id.clone(), OutgoingSend { draft, stage });
        Ok(local_id)
    }

    fn request_creation(&mut self, peer: &str, effects: &mut Effects) {
        if self.creating.insert(peer.to_string()) {
            effects.request(Request::CreateDirect {
                peer: peer.to_string(),
            });
        }
    }

    /// Applies the outcome of creating the direct conversation with `peer`.
    ///
    /// Returns the id of the created conversation on success.
    pub fn on_created(
        &mut self,
        store: &mut ConversationStore,
        peer: &str,
        result: PullResult<commz_core::Conversation>,
        effects: &mut Effects,
    ) -> Option<String> {
        self.creating.remove(peer);
        let waiting: Vec<String> = self
            .sends
            .iter()
            .filter(|(_, s)| s.stage == Stage::AwaitingConversation { peer: peer.to_string() })
            .map(|(id, _)| id.clone())
            .collect();

        let created = match result {
            Ok(conv) => conv,
            Err(e) => {
                warn!(peer, "creating direct conversation failed: {}", e);
                for local_id in &waiting {
                    self.fail(store, local_id, &e.user_message());
                }
                effects.notice(Notice::request("create conversation", &e));
                effects.changed();
                return None;
            }
        };

        let Some(chat_id) = store.promote(peer, created) else {
            warn!(peer, "server created a conversation without an id");
            for local_id in &waiting {
                self.fail(store, local_id, crate::pull::GENERIC_FAILURE);
            }
            effects.changed();
            return None;
        };

        for local_id in waiting {
            if let Some(send) = self.sends.get_mut(&local_id) {
                send.stage = Stage::Posting;
                effects.request(Request::Send {
                    local_id: local_id.clone(),
                    chat_id: chat_id.clone(),
                    draft: send.draft.clone(),
                });
            }
        }
        effects.changed();
        Some(chat_id)
    }

    /// Applies the server's answer to a post.
    pub fn on_sent(
        &mut self,
        store: &mut ConversationStore,
        local_id: &str,
        result: PullResult<Message>,
        effects: &mut Effects,
    ) {
        match result {
            Ok(confirmed) => {
                self.sends.remove(local_id);
                let already_pushed = store
                    .message(&confirmed.chat_id, &confirmed.id)
                    .is_some();
                if already_pushed {
                    // The push channel won the race; keep its record only
                    store.remove_pending(local_id);
                } else if let Some(pending) = store.pending_mut(local_id) {
                    *pending = Message {
                        local_id: Some(local_id.to_string()),
                        ..confirmed.clone()
                    };
                } else {
                    debug!(local_id, "confirmed send no longer in the store");
                }
                effects.event(SessionEvent::Sent {
                    local_id: local_id.to_string(),
                    message: confirmed,
                });
            }
            Err(e) => {
                warn!(local_id, "send failed: {}", e);
                self.fail(store, local_id, &e.user_message());
                effects.notice(Notice::request("send message", &e));
            }
        }
        effects.changed();
    }

    /// Sends a failed record again.
    pub fn retry(
        &mut self,
        store: &mut ConversationStore,
        local_id: &str,
        effects: &mut Effects,
    ) -> Result<(), SessionError> {
        let not_found = || SessionError::MessageNotFound(local_id.to_string());
        let draft = self
            .sends
            .get(local_id)
            .filter(|s| s.stage == Stage::Failed)
            .map(|s| s.draft.clone())
            .ok_or_else(not_found)?;
        let pending = store.pending_mut(local_id).ok_or_else(not_found)?;
        pending.sending = true;
        pending.failure = None;
        let chat_id = pending.chat_id.clone();

        let stage = if chat_id.is_empty() {
            let peer = store
                .conversations()
                .iter()
                .find(|c| {
                    c.is_provisional()
                        && c.messages
                            .iter()
                            .any(|m| m.local_id.as_deref() == Some(local_id))
                })
                .and_then(|c| c.peer_of(store.viewer()))
                .map(str::to_string)
                .ok_or_else(not_found)?;
            self.request_creation(&peer, effects);
            Stage::AwaitingConversation { peer }
        } else {
            effects.request(Request::Send {
                local_id: local_id.to_string(),
                chat_id,
                draft,
            });
            Stage::Posting
        };
        if let Some(send) = self.sends.get_mut(local_id) {
            send.stage = stage;
        }
        effects.changed();
        Ok(())
    }

    /// Drops a failed record.
    pub fn discard(
        &mut self,
        store: &mut ConversationStore,
        local_id: &str,
        effects: &mut Effects,
    ) -> Result<(), SessionError> {
        match self.sends.get(local_id) {
            Some(send) if send.stage == Stage::Failed => {}
            _ => return Err(SessionError::MessageNotFound(local_id.to_string())),
        }
        self.sends.remove(local_id);
        store.remove_pending(local_id);
        effects.changed();
        Ok(())
    }

    fn fail(&mut self, store: &mut ConversationStore, local_id: &str, reason: &str) {
        if let Some(send) = self.sends.get_mut(local_id) {
            send.stage = Stage::Failed;
        }
        if let Some(pending) = store.pending_mut(local_id) {
            pending.sending = false;
            pending.failure = Some(reason.to_string());
        }
    }
}

fn target_label(target: &Target) -> String {
    match target {
        Target::Conversation(id) => id.clone(),
        Target::Provisional { peer } => format!("direct conversation with {peer}"),
    }
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
