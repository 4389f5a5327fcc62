// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! commz-core: Shared model for the commz sync client
//!
//! This crate provides the conversation data model, the gateway wire frames,
//! the in-memory conversation store and the merge rules used by commz-sync
//! and the commz CLI.

pub mod buffer;
pub mod conversation;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod store;

pub use buffer::{ChunkEffect, StreamBuffer, StreamState};
pub use conversation::{
    Conversation, Message, MessageDraft, Profile, DIRECT_CHAT_NAME, PLACEHOLDER_ID,
};
pub use error::{Error, Result};
pub use merge::{Merge, MergeOutcome};
pub use protocol::{EditFrame, PushFrame, StreamChunk, StreamKind, StreamRequest};
pub use store::{ConversationStore, Target};
