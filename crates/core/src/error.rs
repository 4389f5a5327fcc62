// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for commz-core operations.

use thiserror::Error;

/// All possible errors that can occur in commz-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("invalid stream kind: '{0}'\n  hint: valid kinds are: summarization, rewrite, fix")]
    InvalidStreamKind(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for commz-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
