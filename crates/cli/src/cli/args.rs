// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::Args;
use commz_core::MessageDraft;

use super::non_empty_string;

/// Where a message goes: an existing conversation or a user.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct Recipient {
    /// Conversation id
    #[arg(long, value_name = "id")]
    pub chat: Option<String>,

    /// User id to message directly
    #[arg(long, value_name = "user")]
    pub to: Option<String>,
}

/// Message content arguments.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DraftArgs {
    /// Message text
    #[arg(value_parser = non_empty_string)]
    pub message: String,

    /// Slash command to run, e.g. "guess"
    #[arg(short, long)]
    pub command: Option<String>,

    /// Id of the message being replied to
    #[arg(long, value_name = "id")]
    pub reply_to: Option<String>,
}

impl DraftArgs {
    pub fn to_draft(&self) -> MessageDraft {
        let mut draft = MessageDraft::text(&self.message);
        if let Some(command) = &self.command {
            draft = draft.with_command(command);
        }
        if let Some(reply_to) = &self.reply_to {
            draft = draft.replying_to(reply_to);
        }
        draft
    }
}
