// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Drives a [`Session`] from one task.
//!
//! The runner owns the session and multiplexes three inputs: commands from
//! [`SessionHandle`]s, push channel events, and completions of pull requests
//! it spawned earlier. Pull requests run concurrently; their results are fed
//! back one at a time, so the store only ever has one writer.

use std::sync::Arc;

use chrono::Utc;
use commz_core::{Conversation, MessageDraft, Target};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::channel::{ChannelEvent, ChannelHandle};
use crate::pull::PullClient;
use crate::session::{Completion, Effects, Request, Session, SessionError, SessionEvent};

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Commands accepted by the runner.
#[derive(Debug)]
pub enum Command {
    Refresh,
    Select(Target, Reply<()>),
    OpenDirect(String),
    LoadOlder,
    Submit(MessageDraft, Reply<String>),
    View(String),
    Edit {
        message_id: String,
        content: String,
        reply: Reply<()>,
    },
    Delete {
        message_id: String,
        reply: Reply<()>,
    },
    Retry(String, Reply<()>),
    Discard(String, Reply<()>),
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

/// Copy of the session state, for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub viewer: String,
    pub conversations: Vec<Conversation>,
    pub selected: Option<Target>,
    pub loading_older: bool,
    pub history_exhausted: bool,
    pub unconfirmed_sends: usize,
}

impl SessionSnapshot {
    fn of(session: &Session) -> Self {
        SessionSnapshot {
            viewer: session.viewer().to_string(),
            conversations: session.store().conversations().to_vec(),
            selected: session.selected().cloned(),
            loading_older: session.is_loading_older(),
            history_exhausted: session.history_exhausted(),
            unconfirmed_sends: session.unconfirmed_sends(),
        }
    }

    /// The selected conversation, if it is still present.
    pub fn selected_conversation(&self) -> Option<&Conversation> {
        match self.selected.as_ref()? {
            Target::Conversation(id) => self.conversations.iter().find(|c| c.has_id(id)),
            Target::Provisional { peer } => self
                .conversations
                .iter()
                .find(|c| c.is_provisional() && c.is_direct_with(&self.viewer, peer)),
        }
    }
}

/// Cloneable handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    fn post(&self, command: Command) -> Result<(), SessionError> {
        self.commands.send(command).map_err(|_| SessionError::Closed)
    }

    async fn ask<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.post(make(tx))?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    /// Fetches the conversation list again.
    pub fn refresh(&self) -> Result<(), SessionError> {
        self.post(Command::Refresh)
    }

    pub async fn select(&self, target: Target) -> Result<(), SessionError> {
        self.ask(|reply| Command::Select(target, reply)).await
    }

    /// Opens (and selects) the direct conversation with `peer`.
    pub fn open_direct(&self, peer: impl Into<String>) -> Result<(), SessionError> {
        self.post(Command::OpenDirect(peer.into()))
    }

    pub fn load_older(&self) -> Result<(), SessionError> {
        self.post(Command::LoadOlder)
    }

    /// Submits `draft` to the selected conversation and returns its local id.
    pub async fn submit(&self, draft: MessageDraft) -> Result<String, SessionError> {
        self.ask(|reply| Command::Submit(draft, reply)).await
    }

    pub fn view_message(&self, message_id: impl Into<String>) -> Result<(), SessionError> {
        self.post(Command::View(message_id.into()))
    }

    pub async fn edit_message(
        &self,
        message_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), SessionError> {
        let message_id = message_id.into();
        let content = content.into();
        self.ask(|reply| Command::Edit {
            message_id,
            content,
            reply,
        })
        .await
    }

    pub async fn delete_message(&self, message_id: impl Into<String>) -> Result<(), SessionError> {
        let message_id = message_id.into();
        self.ask(|reply| Command::Delete { message_id, reply }).await
    }

    pub async fn retry(&self, local_id: impl Into<String>) -> Result<(), SessionError> {
        let local_id = local_id.into();
        self.ask(|reply| Command::Retry(local_id, reply)).await
    }

    pub async fn discard(&self, local_id: impl Into<String>) -> Result<(), SessionError> {
        let local_id = local_id.into();
        self.ask(|reply| Command::Discard(local_id, reply)).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.post(Command::Snapshot(tx))?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Stops the runner. Requests still in flight are dropped.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.post(Command::Shutdown)
    }
}

/// Owns a session and carries out its effects.
pub struct SessionRunner<P> {
    session: Session,
    pull: Arc<P>,
    channel: ChannelHandle,
    channel_events: mpsc::Receiver<ChannelEvent>,
    commands: mpsc::UnboundedReceiver<Command>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl<P: PullClient + 'static> SessionRunner<P> {
    /// Creates a runner.
    ///
    /// Returns the runner, a handle to it and the receiver of session events.
    pub fn new(
        session: Session,
        pull: Arc<P>,
        channel: ChannelHandle,
        channel_events: mpsc::Receiver<ChannelEvent>,
    ) -> (Self, SessionHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (completion_tx, completions) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();
        let runner = SessionRunner {
            session,
            pull,
            channel,
            channel_events,
            commands,
            completion_tx,
            completions,
            events,
        };
        (runner, SessionHandle { commands: command_tx }, event_rx)
    }

    /// Runs until shut down or every handle is dropped.
    pub async fn run(mut self) {
        self.channel.connect();
        let effects = self.session.refresh();
        self.apply(effects);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.channel_events.recv() => {
                    let effects = self.session.on_channel_event(event);
                    self.apply(effects);
                }
                Some(completion) = self.completions.recv() => {
                    let effects = self.session.complete(completion);
                    self.apply(effects);
                }
            }
        }

        info!("session stopped");
        self.channel.shutdown();
    }

    fn handle_command(&mut self, command: Command) {
        let now = Utc::now();
        match command {
            Command::Refresh => {
                let effects = self.session.refresh();
                self.apply(effects);
            }
            Command::Select(target, reply) => {
                let result = self.session.select(target);
                self.reply(result, reply);
            }
            Command::OpenDirect(peer) => {
                let effects = self.session.open_direct(&peer, now);
                self.apply(effects);
            }
            Command::LoadOlder => {
                let effects = self.session.load_older();
                self.apply(effects);
            }
            Command::Submit(draft, reply) => {
                let result = self.session.submit(draft, now).map(|(local_id, effects)| {
                    self.apply(effects);
                    local_id
                });
                let _ = reply.send(result);
            }
            Command::View(message_id) => {
                let effects = self.session.view_message(&message_id);
                self.apply(effects);
            }
            Command::Edit {
                message_id,
                content,
                reply,
            } => {
                let result = self.session.edit_message(&message_id, &content);
                self.reply(result, reply);
            }
            Command::Delete { message_id, reply } => {
                let result = self.session.delete_message(&message_id);
                self.reply(result, reply);
            }
            Command::Retry(local_id, reply) => {
                let result = self.session.retry(&local_id);
                self.reply(result, reply);
            }
            Command::Discard(local_id, reply) => {
                let result = self.session.discard(&local_id);
                self.reply(result, reply);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(SessionSnapshot::of(&self.session));
            }
            // Handled by the loop
            Command::Shutdown => {}
        }
    }

    fn reply(&mut self, result: Result<Effects, SessionError>, reply: Reply<()>) {
        let result = result.map(|effects| self.apply(effects));
        let _ = reply.send(result);
    }

    fn apply(&mut self, effects: Effects) {
        let (requests, events) = effects.into_parts();
        for request in requests {
            self.dispatch(request);
        }
        for event in events {
            // Nobody listening is fine
            let _ = self.events.send(event);
        }
    }

    fn dispatch(&self, request: Request) {
        if let Request::Push(frame) = request {
            self.channel.send(&frame);
            return;
        }
        debug!(?request, "dispatching request");
        let pull = Arc::clone(&self.pull);
        let completions = self.completion_tx.clone();
        tokio::spawn(async move {
            if let Some(completion) = perform(pull.as_ref(), request).await {
                let _ = completions.send(completion);
            }
        });
    }
}

async fn perform<P: PullClient>(pull: &P, request: Request) -> Option<Completion> {
    let completion = match request {
        Request::ListConversations => Completion::Conversations(pull.list_conversations().await),
        Request::FetchPage(request) => {
            let result = pull
                .fetch_messages(&request.chat_id, request.limit, request.offset)
                .await;
            Completion::Page { request, result }
        }
        Request::CreateDirect { peer } => {
            let result = pull.create_direct(&peer, "").await;
            Completion::Created { peer, result }
        }
        Request::Send {
            local_id,
            chat_id,
            draft,
        } => {
            let result = pull.send_message(&chat_id, &draft).await;
            Completion::Sent { local_id, result }
        }
        Request::MarkRead {
            chat_id,
            message_id,
        } => {
            let result = pull.mark_read(&message_id).await;
            Completion::MarkedRead {
                chat_id,
                message_id,
                result,
            }
        }
        Request::Push(_) => return None,
    };
    Some(completion)
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
