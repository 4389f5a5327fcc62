// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use commz_core::{Conversation, Message, Target};
use commz_sync::{SessionError, SessionEvent, SessionHandle, SessionSnapshot};
use tracing::debug;

use super::{notice_text, Context, LiveSession};
use crate::colors;
use crate::display::{conversation_title, format_message};
use crate::error::{Error, Result};

/// What a watched message looks like on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Change {
    New,
    Edited,
    Deleted,
}

/// Remembers which server messages were already printed.
#[derive(Debug, Default)]
pub(crate) struct Seen {
    /// `(chat id, message id)` to `(content, deleted)`.
    messages: HashMap<(String, String), (String, bool)>,
}

impl Seen {
    /// Records everything in `conversations` without reporting it.
    pub(crate) fn prime(&mut self, conversations: &[Conversation]) {
        let _ = self.diff(conversations, None);
    }

    /// Returns confirmed messages that are new or changed since the last call.
    ///
    /// Local sends are skipped until the server confirms them.
    pub(crate) fn diff<'a>(
        &mut self,
        conversations: &'a [Conversation],
        only: Option<&str>,
    ) -> Vec<(Change, &'a Conversation, &'a Message)> {
        let mut changes = Vec::new();
        for conv in conversations {
            let Some(chat_id) = conv.id.as_deref() else {
                continue;
            };
            if only.is_some_and(|only| only != chat_id) {
                continue;
            }
            for msg in conv.messages.iter().filter(|m| !m.is_placeholder()) {
                let key = (chat_id.to_string(), msg.id.clone());
                let state = (msg.content.clone(), msg.deleted);
                let change = match self.messages.get(&key) {
                    None => Some(Change::New),
                    Some((_, false)) if msg.deleted => Some(Change::Deleted),
                    Some(previous) if *previous != state && !msg.deleted => Some(Change::Edited),
                    Some(_) => None,
                };
                if let Some(change) = change {
                    self.messages.insert(key, state);
                    changes.push((change, conv, msg));
                }
            }
        }
        changes
    }
}

pub async fn run(ctx: &Context, chat: Option<&str>) -> Result<()> {
    let mut session = ctx.start_session().await?;
    let result = follow(&mut session, chat).await;
    session.stop().await;
    result
}

async fn follow(session: &mut LiveSession, chat: Option<&str>) -> Result<()> {
    session.ready().await?;
    if let Some(chat) = chat {
        session
            .handle
            .select(Target::Conversation(chat.to_string()))
            .await
            .map_err(|e| match e {
                SessionError::ConversationNotFound(_) => Error::ConversationNotFound(chat.to_string()),
                other => other.into(),
            })?;
    }

    let mut seen = Seen::default();
    let snapshot = session.handle.snapshot().await?;
    seen.prime(&snapshot.conversations);
    if chat.is_some() {
        mark_viewed(&session.handle, &snapshot)?;
    }
    eprintln!("{}", colors::context("watching for messages, ctrl-c to stop"));

    loop {
        tokio::select! {
            event = session.events.recv() => {
                let Some(event) = event else {
                    return Err(Error::SessionEnded);
                };
                match event {
                    SessionEvent::Changed => {
                        let snapshot = session.handle.snapshot().await?;
                        for (change, conv, msg) in seen.diff(&snapshot.conversations, chat) {
                            println!("{}", render(change, conv, msg, &snapshot.viewer, chat.is_none()));
                        }
                        if chat.is_some() {
                            mark_viewed(&session.handle, &snapshot)?;
                        }
                    }
                    SessionEvent::Notice(notice) => {
                        eprintln!("{}", colors::warning(&format!("warning: {}", notice_text(&notice))));
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                return Ok(());
            }
        }
    }
}

/// Reports every unread message of the selected conversation as seen.
fn mark_viewed(handle: &SessionHandle, snapshot: &SessionSnapshot) -> Result<()> {
    let Some(conv) = snapshot.selected_conversation() else {
        return Ok(());
    };
    for msg in conv
        .messages
        .iter()
        .filter(|m| !m.read && !m.is_placeholder() && m.sender != snapshot.viewer)
    {
        handle.view_message(msg.id.clone())?;
    }
    Ok(())
}

pub(crate) fn render(
    change: Change,
    conv: &Conversation,
    msg: &Message,
    viewer: &str,
    with_title: bool,
) -> String {
    let mut line = String::new();
    if with_title {
        line.push_str(&colors::header(&format!("#{}", conversation_title(conv, viewer))));
        line.push(' ');
    }
    line.push_str(&format_message(msg, viewer));
    match change {
        Change::New => {}
        Change::Edited => line.push_str(&colors::context(" (edited)")),
        Change::Deleted => {}
    }
    line
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
