// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn unauthorized_status_maps_to_hint() {
    let err: Error = PullError::Request {
        status: 401,
        message: Some("invalid token".into()),
    }
    .into();
    assert!(matches!(err, Error::Unauthorized));
    assert!(err.to_string().contains("COMMZ_TOKEN"));
}

#[test]
fn other_statuses_keep_server_message() {
    let err: Error = PullError::Request {
        status: 404,
        message: Some("chat not found".into()),
    }
    .into();
    assert!(matches!(err, Error::Pull(_)));
    assert!(err.to_string().contains("chat not found"));
}

#[test]
fn missing_token_has_hint() {
    let msg = Error::MissingToken.to_string();
    assert!(msg.contains("not signed in"));
    assert!(msg.contains("--token"));
}

#[test]
fn stream_error_display() {
    let err: Error = StreamError::Server("model unavailable".into()).into();
    assert_eq!(err.to_string(), "AI response failed: model unavailable");
}

#[test]
fn session_error_is_transparent() {
    let err: Error = SessionError::NoSelection.into();
    assert_eq!(err.to_string(), "no conversation selected");
}
