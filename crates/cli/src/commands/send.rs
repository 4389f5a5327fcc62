// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use commz_core::{Message, MessageDraft, Target};
use commz_sync::{Notice, SessionError, SessionEvent};
use tokio::sync::mpsc;
use tracing::debug;

use super::{notice_text, Context, LiveSession};
use crate::cli::{DraftArgs, Recipient};
use crate::error::{Error, Result};

/// Operations whose failure means our message did not go out.
const SEND_OPERATIONS: [&str; 2] = ["send message", "create conversation"];

pub async fn run(ctx: &Context, recipient: &Recipient, draft: &DraftArgs) -> Result<()> {
    let mut session = ctx.start_session().await?;
    let result = deliver(&mut session, recipient, draft.to_draft()).await;
    session.stop().await;
    let message = result?;
    println!("sent {} to {}", message.id, message.chat_id);
    Ok(())
}

async fn deliver(
    session: &mut LiveSession,
    recipient: &Recipient,
    draft: MessageDraft,
) -> Result<Message> {
    session.ready().await?;
    match (&recipient.chat, &recipient.to) {
        (Some(chat), _) => session
            .handle
            .select(Target::Conversation(chat.clone()))
            .await
            .map_err(|e| match e {
                SessionError::ConversationNotFound(_) => Error::ConversationNotFound(chat.clone()),
                other => other.into(),
            })?,
        (None, Some(peer)) => session.handle.open_direct(peer.clone())?,
        (None, None) => return Err(SessionError::NoSelection.into()),
    }
    let local_id = session.handle.submit(draft).await?;
    debug!(%local_id, "message submitted");
    wait_for_sent(&mut session.events, &local_id).await
}

/// Waits until the send tagged `local_id` is confirmed or fails.
///
/// Notices about unrelated operations are printed and otherwise ignored.
pub(crate) async fn wait_for_sent(
    events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    local_id: &str,
) -> Result<Message> {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Sent {
                local_id: confirmed,
                message,
            } if confirmed == local_id => return Ok(message),
            SessionEvent::Notice(Notice::Request { operation, message })
                if SEND_OPERATIONS.contains(&operation.as_str()) =>
            {
                return Err(Error::SendFailed(message));
            }
            SessionEvent::Notice(notice) => eprintln!("warning: {}", notice_text(&notice)),
            _ => {}
        }
    }
    Err(Error::SessionEnded)
}

#[cfg(test)]
#[path = "send_tests.rs"]
mod tests;
