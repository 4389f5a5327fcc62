// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use commz_sync::{ConfigError, PullError, SessionError, StreamError};
use thiserror::Error;

/// Errors reported by commz commands.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not signed in\n  hint: pass --token or set COMMZ_TOKEN")]
    MissingToken,

    #[error("the gateway rejected the token\n  hint: sign in again and update COMMZ_TOKEN")]
    Unauthorized,

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("config file already exists: {0}\n  hint: pass --force to overwrite it")]
    ConfigExists(String),

    #[error("no config directory on this system\n  hint: pass --config <path>")]
    NoConfigDir,

    #[error("message not sent: {0}")]
    SendFailed(String),

    #[error("{0}")]
    Notice(String),

    #[error("the session stopped before the gateway answered")]
    SessionEnded,

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Pull(PullError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("AI response failed: {0}")]
    Stream(#[from] StreamError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PullError> for Error {
    fn from(e: PullError) -> Self {
        if e.is_unauthorized() {
            Error::Unauthorized
        } else {
            Error::Pull(e)
        }
    }
}

/// Result type for commz commands.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
