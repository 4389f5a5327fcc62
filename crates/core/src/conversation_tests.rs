// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn message(id: &str, sender: &str, read: bool) -> Message {
    Message {
        id: id.to_string(),
        chat_id: "c1".to_string(),
        sender: sender.to_string(),
        content: format!("content of {id}"),
        command: None,
        media: Vec::new(),
        reply_to: None,
        deleted: false,
        read,
        timestamp: at(100),
        sending: false,
        failure: None,
        local_id: None,
    }
}

#[test]
fn gateway_message_json_decodes() {
    let json = r#"{
        "id": "7b0c",
        "content": "hi",
        "command": "",
        "sender": "u1",
        "chat_id": "c1",
        "updatedAt": "2026-01-01T00:00:00Z",
        "timestamp": "2026-01-01T00:00:00Z",
        "media": null,
        "read": false,
        "reply_to": null,
        "deleted": false
    }"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg.id, "7b0c");
    assert_eq!(msg.command, None);
    assert!(msg.media.is_empty());
    assert!(!msg.sending);
    assert!(msg.local_id.is_none());
}

#[test]
fn local_fields_are_not_serialized() {
    let mut msg = message("1", "u1", false);
    msg.sending = true;
    msg.local_id = Some("tok".into());
    let json = serde_json::to_string(&msg).unwrap();
    assert!(!json.contains("sending"));
    assert!(!json.contains("local_id"));
    assert!(!json.contains("tok"));
}

#[test]
fn gateway_conversation_json_decodes_with_null_messages() {
    let json = r#"{
        "id": "c1",
        "name": "Direct Chat",
        "members": ["u1", "u2"],
        "messages": null,
        "creator_id": "u1",
        "created_at": "2026-01-01T00:00:00Z",
        "last_active": "2026-01-02T00:00:00Z"
    }"#;
    let conv: Conversation = serde_json::from_str(json).unwrap();
    assert!(!conv.is_provisional());
    assert!(conv.messages.is_empty());
    assert_eq!(conv.peer_of("u1"), Some("u2"));
}

#[test]
fn provisional_conversation_has_no_id() {
    let conv = Conversation::provisional("u1", "u2", at(0));
    assert!(conv.is_provisional());
    assert!(conv.is_direct_with("u1", "u2"));
    assert!(!conv.is_direct_with("u1", "u3"));
    assert_eq!(conv.name, DIRECT_CHAT_NAME);
}

#[parameterized(
    two_placeholders = { PLACEHOLDER_ID, PLACEHOLDER_ID, false },
    placeholder_vs_real = { PLACEHOLDER_ID, "5", false },
    real_vs_placeholder = { "5", PLACEHOLDER_ID, false },
    same_real = { "5", "5", true },
    different_real = { "5", "6", false },
)]
fn same_server_id_never_matches_placeholders(left: &str, right: &str, expected: bool) {
    let msg = message(left, "u1", false);
    assert_eq!(msg.same_server_id(right), expected);
}

#[test]
fn pending_message_copies_draft() {
    let draft = MessageDraft::text("hello")
        .with_command("guess")
        .with_media(vec!["img".into()])
        .replying_to("9");
    let msg = Message::pending("local-1", "c1", "u1", &draft, at(5));
    assert!(msg.is_placeholder());
    assert!(msg.is_pending());
    assert!(msg.sending);
    assert_eq!(msg.content, "hello");
    assert_eq!(msg.command.as_deref(), Some("guess"));
    assert_eq!(msg.reply_to.as_deref(), Some("9"));
}

#[test]
fn soft_delete_clears_content_and_keeps_record() {
    let mut msg = message("1", "u1", false);
    msg.soft_delete();
    assert!(msg.deleted);
    assert!(msg.content.is_empty());
    assert_eq!(msg.id, "1");
}

#[test]
fn unread_and_confirmed_counts() {
    let mut conv = Conversation::provisional("u1", "u2", at(0));
    conv.messages.push(message("1", "u2", false));
    conv.messages.push(message("2", "u2", true));
    conv.messages.push(message("3", "u1", false));
    conv.messages
        .push(Message::pending("l", "c1", "u1", &MessageDraft::text("x"), at(1)));

    assert_eq!(conv.unread_count("u1"), 1);
    assert_eq!(conv.confirmed_count(), 3);
    assert!(conv.last_message().unwrap().is_pending());
}

#[test]
fn draft_serializes_as_send_request_body() {
    let draft = MessageDraft::text("hi").replying_to("3");
    let json: serde_json::Value = serde_json::to_value(&draft).unwrap();
    assert_eq!(json["message"], "hi");
    assert_eq!(json["reply_to"], "3");
    assert!(json.get("command").is_none());
}

#[parameterized(
    empty = { MessageDraft::default(), true },
    text = { MessageDraft::text("a"), false },
    media_only = { MessageDraft::default().with_media(vec!["m".into()]), false },
)]
fn draft_emptiness(draft: MessageDraft, expected: bool) {
    assert_eq!(draft.is_empty(), expected);
}
