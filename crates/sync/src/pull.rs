// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response boundary to the gateway.
//!
//! The session never talks HTTP itself. It asks a [`PullClient`] for
//! conversations and pages, and for every write the user makes.

use std::future::Future;
use std::pin::Pin;

use commz_core::{Conversation, Message, MessageDraft, Profile};
use thiserror::Error;

/// Generic text shown when the server gave no reason.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";

/// Errors from pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PullError {
    /// The server answered with a failure status.
    #[error("request failed with status {status}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Request {
        status: u16,
        /// The `error` field of the response body, when present.
        message: Option<String>,
    },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("failed to parse response: {0}")]
    Decode(String),
}

impl PullError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            PullError::Request {
                message: Some(message),
                ..
            } => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// Returns true if the server refused the credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PullError::Request { status: 401, .. })
    }
}

/// Result type for pull requests.
pub type PullResult<T> = Result<T, PullError>;

/// Boxed future returned by [`PullClient`] methods.
pub type PullFuture<'a, T> = Pin<Box<dyn Future<Output = PullResult<T>> + Send + 'a>>;

/// Gateway operations the client depends on.
pub trait PullClient: Send + Sync {
    /// Every conversation the viewer is a member of, with recent messages.
    fn list_conversations(&self) -> PullFuture<'_, Vec<Conversation>>;

    /// Up to `limit` older messages of `chat_id`, skipping the newest `offset`.
    fn fetch_messages(&self, chat_id: &str, limit: usize, offset: usize)
        -> PullFuture<'_, Vec<Message>>;

    /// Posts a message and returns the stored record.
    fn send_message(&self, chat_id: &str, draft: &MessageDraft) -> PullFuture<'_, Message>;

    /// Marks one message read.
    fn mark_read(&self, message_id: &str) -> PullFuture<'_, Message>;

    /// Soft-deletes a message.
    fn delete_message(&self, message_id: &str) -> PullFuture<'_, Message>;

    /// Creates the direct conversation with `peer`.
    ///
    /// An empty `first_message` creates the conversation without messages.
    fn create_direct(&self, peer: &str, first_message: &str) -> PullFuture<'_, Conversation>;

    fn create_group(&self, name: &str, members: &[String]) -> PullFuture<'_, Conversation>;

    fn update_group(
        &self,
        chat_id: &str,
        name: &str,
        members: &[String],
    ) -> PullFuture<'_, Conversation>;

    fn delete_group(&self, chat_id: &str) -> PullFuture<'_, ()>;

    /// The authenticated user.
    fn current_user(&self) -> PullFuture<'_, Profile>;

    /// Every registered user.
    fn list_users(&self) -> PullFuture<'_, Vec<Profile>>;

    fn update_profile(&self, profile: &Profile) -> PullFuture<'_, Profile>;

    /// Uploads raw bytes and returns the media reference.
    fn upload_media(&self, bytes: Vec<u8>, content_type: &str) -> PullFuture<'_, String>;

    /// Version string of `service` (`"gateway"` for the gateway itself).
    fn fetch_version(&self, service: &str) -> PullFuture<'_, String>;

    /// Retrieval URL for a media reference.
    fn media_url(&self, reference: &str) -> String;
}

#[cfg(test)]
#[path = "pull_tests.rs"]
mod tests;
