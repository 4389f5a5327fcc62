// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text rendering of conversations and messages.

use chrono::{DateTime, Utc};
use commz_core::{Conversation, Message, Profile, DIRECT_CHAT_NAME};

use crate::colors;

/// Maximum characters of a message shown in a conversation listing.
const PREVIEW_WIDTH: usize = 48;

pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// Name shown for a conversation: the peer for direct chats, the group name
/// otherwise.
pub fn conversation_title(conv: &Conversation, viewer: &str) -> String {
    if conv.name == DIRECT_CHAT_NAME && conv.members.len() == 2 {
        if let Some(peer) = conv.peer_of(viewer) {
            return peer.to_string();
        }
    }
    conv.name.clone()
}

/// Truncate `text` to `max` characters, marking the cut with an ellipsis.
pub fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max && !text.contains('\n') {
        return line.to_string();
    }
    let kept: String = line.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Visible text of a message.
pub fn message_body(msg: &Message) -> String {
    if msg.deleted {
        return "(deleted)".to_string();
    }
    let mut body = match &msg.command {
        Some(command) => format!("/{command} {}", msg.content),
        None => msg.content.clone(),
    };
    if !msg.media.is_empty() {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(&format!("[+{} media]", msg.media.len()));
    }
    body
}

/// Delivery state of a local send, if it is one.
pub fn message_status(msg: &Message) -> Option<String> {
    if let Some(reason) = &msg.failure {
        return Some(format!("failed: {reason}"));
    }
    msg.sending.then(|| "sending".to_string())
}

/// One line for a message: `[time] sender: body (status)`.
pub fn format_message(msg: &Message, viewer: &str) -> String {
    let sender = if msg.sender == viewer {
        "you"
    } else {
        msg.sender.as_str()
    };
    let mut line = format!(
        "{} {}: {}",
        colors::context(&format!("[{}]", format_time(msg.timestamp))),
        colors::literal(sender),
        message_body(msg)
    );
    if let Some(status) = message_status(msg) {
        line.push(' ');
        line.push_str(&colors::warning(&format!("({status})")));
    }
    line
}

/// One line for a conversation listing.
pub fn format_conversation(conv: &Conversation, viewer: &str) -> String {
    let id = conv.id.as_deref().unwrap_or("-");
    let mut line = format!("{id:<8} {}", colors::header(&conversation_title(conv, viewer)));
    let unread = conv.unread_count(viewer);
    if unread > 0 {
        line.push_str(&format!("  [{unread} unread]"));
    }
    if let Some(last) = conv.last_message() {
        line.push_str("  ");
        line.push_str(&colors::context(&preview(&message_body(last), PREVIEW_WIDTH)));
    }
    line
}

/// Conversations ordered for display, most recently active first.
///
/// Only the listing is ordered; stored messages keep arrival order.
pub fn by_activity(conversations: &[Conversation]) -> Vec<&Conversation> {
    let mut sorted: Vec<&Conversation> = conversations.iter().collect();
    sorted.sort_by(|a, b| b.last_active.cmp(&a.last_active));
    sorted
}

pub fn format_user(profile: &Profile) -> String {
    format!("{:<12} {} <{}>", profile.id, profile.display_name(), profile.email)
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
