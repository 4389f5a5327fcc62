// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use commz_core::Conversation;
use commz_sync::PullClient;

use super::Context;
use crate::cli::OutputFormat;
use crate::display::{by_activity, format_conversation};
use crate::error::Result;

pub async fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let viewer = ctx.viewer().await?;
    let conversations = ctx.pull.list_conversations().await?;
    let mut stdout = std::io::stdout().lock();
    render(&mut stdout, &conversations, &viewer, output)
}

/// Writes the conversation listing.
pub(crate) fn render(
    out: &mut impl Write,
    conversations: &[Conversation],
    viewer: &str,
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(conversations)?)?;
        }
        OutputFormat::Text => {
            if conversations.is_empty() {
                writeln!(out, "No conversations")?;
            }
            for conv in by_activity(conversations) {
                writeln!(out, "{}", format_conversation(conv, viewer))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "chats_tests.rs"]
mod tests;
