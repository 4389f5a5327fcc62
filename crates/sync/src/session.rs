// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The synchronization session.
//!
//! [`Session`] is the single writer of the conversation store. Its handlers
//! are synchronous: each one updates local state and returns the [`Effects`]
//! it wants carried out, i.e. requests to issue and events to surface. The
//! answers to those requests come back as [`Completion`] values. Because a
//! session is driven from one loop, writes to the store never interleave.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ ChannelEvent ┌─────────┐  Request   ┌────────────┐
//! │ push channel │─────────────►│ Session │───────────►│ PullClient │
//! └──────────────┘              │ (store) │◄───────────│  (spawned) │
//!        ▲        Push(frame)   └─────────┘ Completion └────────────┘
//!        └─────────────────────────┘  │ SessionEvent
//!                                     ▼
//!                                   caller
//! ```

use chrono::{DateTime, Utc};
use commz_core::{
    Conversation, ConversationStore, EditFrame, Merge, MergeOutcome, Message, MessageDraft,
    PushFrame, Target,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::channel::ChannelEvent;
use crate::outbox::Outbox;
use crate::pager::{HistoryPager, PageOutcome, PageRequest};
use crate::pull::{PullError, PullResult};
use crate::read::ReadTracker;

/// Errors from session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("message not found: {0}")]
    MessageNotFound(String),

    #[error("no conversation selected")]
    NoSelection,

    #[error("nothing to send")]
    EmptyDraft,

    #[error("session stopped")]
    Closed,
}

/// Work the session wants done outside itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Fetch the full conversation list.
    ListConversations,
    /// Fetch one page of older history.
    FetchPage(PageRequest),
    /// Create the direct conversation with `peer`.
    CreateDirect { peer: String },
    /// Post the pending send `local_id`.
    Send {
        local_id: String,
        chat_id: String,
        draft: MessageDraft,
    },
    MarkRead { chat_id: String, message_id: String },
    /// Write a frame on the push channel.
    Push(EditFrame),
}

/// The answer to a [`Request`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Conversations(PullResult<Vec<Conversation>>),
    Page {
        request: PageRequest,
        result: PullResult<Vec<Message>>,
    },
    Created {
        peer: String,
        result: PullResult<Conversation>,
    },
    Sent {
        local_id: String,
        result: PullResult<Message>,
    },
    MarkedRead {
        chat_id: String,
        message_id: String,
        result: PullResult<Message>,
    },
}

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The server sent an `{error}` frame on the push channel.
    Server(String),
    /// A request failed.
    Request { operation: String, message: String },
}

impl Notice {
    pub fn request(operation: &str, error: &PullError) -> Self {
        Notice::Request {
            operation: operation.to_string(),
            message: error.user_message(),
        }
    }
}

/// Events surfaced to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The store changed; re-render.
    Changed,
    Notice(Notice),
    /// A local send was confirmed.
    Sent { local_id: String, message: Message },
    /// A history page was applied.
    PageLoaded {
        chat_id: String,
        inserted: usize,
        exhausted: bool,
    },
}

/// Requests and events produced by one handler call.
#[derive(Debug, Default)]
pub struct Effects {
    pub requests: Vec<Request>,
    pub events: Vec<SessionEvent>,
    changed: bool,
}

impl Effects {
    pub fn request(&mut self, request: Request) {
        self.requests.push(request);
    }

    pub fn event(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    pub fn notice(&mut self, notice: Notice) {
        self.events.push(SessionEvent::Notice(notice));
    }

    /// Marks the store as changed.
    pub fn changed(&mut self) {
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn notices(&self) -> Vec<&Notice> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Notice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Splits into requests and events, with `Changed` last when set.
    pub fn into_parts(mut self) -> (Vec<Request>, Vec<SessionEvent>) {
        if self.changed {
            self.events.push(SessionEvent::Changed);
        }
        (self.requests, self.events)
    }
}

#[derive(Debug, Default)]
struct RefreshState {
    in_flight: bool,
    /// Another refresh is wanted once the current one lands.
    queued: bool,
}

/// One viewer's synchronization state.
#[derive(Debug)]
pub struct Session {
    store: ConversationStore,
    selected: Option<Target>,
    pager: HistoryPager,
    outbox: Outbox,
    read: ReadTracker,
    refresh: RefreshState,
    connected_before: bool,
}

impl Session {
    pub fn new(viewer: impl Into<String>, page_size: usize) -> Self {
        Self::with_store(ConversationStore::new(viewer), page_size)
    }

    pub fn with_store(store: ConversationStore, page_size: usize) -> Self {
        Session {
            store,
            selected: None,
            pager: HistoryPager::new(page_size),
            outbox: Outbox::new(),
            read: ReadTracker::new(),
            refresh: RefreshState::default(),
            connected_before: false,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn viewer(&self) -> &str {
        self.store.viewer()
    }

    pub fn selected(&self) -> Option<&Target> {
        self.selected.as_ref()
    }

    pub fn selected_conversation(&self) -> Option<&Conversation> {
        self.selected.as_ref().and_then(|t| self.store.resolve(t))
    }

    /// Sends not yet confirmed, failed ones included.
    pub fn unconfirmed_sends(&self) -> usize {
        self.outbox.len()
    }

    /// Returns true while an older page of the selection is loading.
    pub fn is_loading_older(&self) -> bool {
        self.selected_id().is_some_and(|id| self.pager.is_busy(id))
    }

    /// Returns true once the selection's history is fully loaded.
    pub fn history_exhausted(&self) -> bool {
        self.selected_id().is_some_and(|id| self.pager.is_exhausted(id))
    }

    fn selected_id(&self) -> Option<&str> {
        match &self.selected {
            Some(Target::Conversation(id)) => Some(id),
            _ => None,
        }
    }

    /// Requests the full conversation list.
    ///
    /// At most one list request is in flight; asking again meanwhile queues a
    /// single follow-up.
    pub fn refresh(&mut self) -> Effects {
        let mut effects = Effects::default();
        self.request_refresh(&mut effects);
        effects
    }

    fn request_refresh(&mut self, effects: &mut Effects) {
        if self.refresh.in_flight {
            self.refresh.queued = true;
            return;
        }
        self.refresh.in_flight = true;
        effects.request(Request::ListConversations);
    }

    /// Makes `target` the conversation being viewed.
    pub fn select(&mut self, target: Target) -> Result<Effects, SessionError> {
        if self.store.resolve(&target).is_none() {
            return Err(SessionError::ConversationNotFound(match target {
                Target::Conversation(id) => id,
                Target::Provisional { peer } => peer,
            }));
        }
        let mut effects = Effects::default();
        self.set_selection(Some(target));
        effects.changed();
        Ok(effects)
    }

    fn set_selection(&mut self, target: Option<Target>) {
        if self.selected != target {
            self.pager.reset();
            self.read.reset();
        }
        self.selected = target;
    }

    /// Opens the direct conversation with `peer` and selects it.
    ///
    /// Creates a provisional conversation when none exists yet.
    pub fn open_direct(&mut self, peer: &str, now: DateTime<Utc>) -> Effects {
        let target = self.store.open_direct(peer, now);
        let mut effects = Effects::default();
        self.set_selection(Some(target));
        effects.changed();
        effects
    }

    /// Requests the next older page of the selected conversation.
    pub fn load_older(&mut self) -> Effects {
        let mut effects = Effects::default();
        let Some(chat_id) = self.selected_id().map(str::to_string) else {
            return effects;
        };
        if let Some(request) = self.pager.load_older(&self.store, &chat_id) {
            effects.request(Request::FetchPage(request));
        }
        effects
    }

    /// Sends `draft` to the selected conversation.
    ///
    /// The pending record is in the store when this returns.
    pub fn submit(
        &mut self,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<(String, Effects), SessionError> {
        let target = self.selected.clone().ok_or(SessionError::NoSelection)?;
        let mut effects = Effects::default();
        let local_id = self
            .outbox
            .submit(&mut self.store, &target, draft, now, &mut effects)?;
        Ok((local_id, effects))
    }

    /// Records that the viewer saw `message_id` in the selected conversation.
    pub fn view_message(&mut self, message_id: &str) -> Effects {
        let mut effects = Effects::default();
        if let Some(chat_id) = self.selected_id().map(str::to_string) {
            self.read
                .on_view(&mut self.store, &chat_id, message_id, &mut effects);
        }
        effects
    }

    /// Replaces the content of one of the selected conversation's messages.
    ///
    /// The store is not touched; the server pushes the edited message back.
    pub fn edit_message(&mut self, message_id: &str, content: &str) -> Result<Effects, SessionError> {
        if content.is_empty() {
            return Err(SessionError::EmptyDraft);
        }
        let message = self.selected_message(message_id)?;
        let mut effects = Effects::default();
        effects.request(Request::Push(EditFrame::edit(message, content)));
        Ok(effects)
    }

    /// Soft-deletes one of the selected conversation's messages.
    pub fn delete_message(&mut self, message_id: &str) -> Result<Effects, SessionError> {
        let message = self.selected_message(message_id)?;
        let mut effects = Effects::default();
        effects.request(Request::Push(EditFrame::delete(message)));
        Ok(effects)
    }

    fn selected_message(&self, message_id: &str) -> Result<&Message, SessionError> {
        let chat_id = self.selected_id().ok_or(SessionError::NoSelection)?;
        self.store
            .message(chat_id, message_id)
            .ok_or_else(|| SessionError::MessageNotFound(message_id.to_string()))
    }

    /// Sends a failed record again.
    pub fn retry(&mut self, local_id: &str) -> Result<Effects, SessionError> {
        let mut effects = Effects::default();
        self.outbox.retry(&mut self.store, local_id, &mut effects)?;
        Ok(effects)
    }

    /// Drops a failed record.
    pub fn discard(&mut self, local_id: &str) -> Result<Effects, SessionError> {
        let mut effects = Effects::default();
        self.outbox.discard(&mut self.store, local_id, &mut effects)?;
        Ok(effects)
    }

    /// Handles one event from the push channel.
    pub fn on_channel_event(&mut self, event: ChannelEvent) -> Effects {
        let mut effects = Effects::default();
        match event {
            ChannelEvent::Connected => {
                if self.connected_before {
                    info!("push channel reconnected, refreshing conversations");
                    self.request_refresh(&mut effects);
                }
                self.connected_before = true;
            }
            ChannelEvent::Frame(PushFrame::Message(message)) => {
                self.on_pushed_message(message, &mut effects);
            }
            ChannelEvent::Frame(PushFrame::Error { error }) => {
                warn!("server error on push channel: {}", error);
                effects.notice(Notice::Server(error));
            }
            ChannelEvent::Closed { reason } => {
                debug!(reason = reason.as_deref().unwrap_or("closed"), "push channel closed");
            }
        }
        effects
    }

    fn on_pushed_message(&mut self, message: Message, effects: &mut Effects) {
        match self.store.merge_message(message) {
            MergeOutcome::UnknownConversation(chat_id) => {
                debug!(chat_id = %chat_id, "message for unknown conversation, refreshing");
                self.request_refresh(effects);
            }
            MergeOutcome::Updated { .. } | MergeOutcome::Appended { .. } => effects.changed(),
        }
    }

    /// Applies the answer to an earlier request.
    pub fn complete(&mut self, completion: Completion) -> Effects {
        let mut effects = Effects::default();
        match completion {
            Completion::Conversations(result) => self.on_conversations(result, &mut effects),
            Completion::Page { request, result } => {
                match self.pager.on_page(&mut self.store, &request, result) {
                    PageOutcome::Loaded {
                        inserted,
                        exhausted,
                    } => {
                        if inserted > 0 {
                            effects.changed();
                        }
                        effects.event(SessionEvent::PageLoaded {
                            chat_id: request.chat_id,
                            inserted,
                            exhausted,
                        });
                    }
                    PageOutcome::Stale => {}
                    PageOutcome::Failed(e) => {
                        warn!(chat_id = %request.chat_id, "loading history failed: {}", e);
                        effects.notice(Notice::request("load history", &e));
                    }
                }
            }
            Completion::Created { peer, result } => {
                let created =
                    self.outbox
                        .on_created(&mut self.store, &peer, result, &mut effects);
                if let Some(chat_id) = created {
                    if self.selected == Some(Target::Provisional { peer }) {
                        self.selected = Some(Target::Conversation(chat_id));
                    }
                }
            }
            Completion::Sent { local_id, result } => {
                self.outbox
                    .on_sent(&mut self.store, &local_id, result, &mut effects);
            }
            Completion::MarkedRead {
                chat_id,
                message_id,
                result,
            } => {
                self.read
                    .on_marked(&mut self.store, &chat_id, &message_id, result, &mut effects);
            }
        }
        effects
    }

    fn on_conversations(&mut self, result: PullResult<Vec<Conversation>>, effects: &mut Effects) {
        self.refresh.in_flight = false;
        match result {
            Ok(conversations) => {
                debug!(count = conversations.len(), "conversation list refreshed");
                self.store.replace_all(conversations);
                self.pager.reset();
                self.reconcile_selection();
                effects.changed();
                if std::mem::take(&mut self.refresh.queued) {
                    self.request_refresh(effects);
                }
            }
            Err(e) => {
                warn!("refreshing conversations failed: {}", e);
                effects.notice(Notice::request("refresh conversations", &e));
                if std::mem::take(&mut self.refresh.queued) {
                    self.request_refresh(effects);
                }
            }
        }
    }

    /// Keeps the selection pointing at something the store still holds.
    fn reconcile_selection(&mut self) {
        let Some(target) = self.selected.clone() else {
            return;
        };
        if self.store.resolve(&target).is_some() {
            return;
        }
        let replacement = match &target {
            // A refresh folded the provisional conversation into the created one
            Target::Provisional { peer } => self
                .store
                .conversations()
                .iter()
                .find(|c| c.is_direct_with(self.store.viewer(), peer))
                .and_then(|c| c.id.clone())
                .map(Target::Conversation),
            Target::Conversation(_) => None,
        };
        match replacement {
            Some(target) => self.selected = Some(target),
            None => self.set_selection(None),
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
