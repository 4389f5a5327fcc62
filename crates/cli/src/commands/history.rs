// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use commz_core::Message;
use commz_sync::PullClient;

use super::Context;
use crate::cli::OutputFormat;
use crate::display::format_message;
use crate::error::Result;

/// Prints one page of `chat`, oldest first.
pub async fn run(
    ctx: &Context,
    chat: &str,
    offset: usize,
    limit: usize,
    output: OutputFormat,
) -> Result<()> {
    let viewer = ctx.viewer().await?;
    let page = ctx.pull.fetch_messages(chat, limit, offset).await?;
    let mut stdout = std::io::stdout().lock();
    render(&mut stdout, &page, &viewer, limit, output)
}

pub(crate) fn render(
    out: &mut impl Write,
    page: &[Message],
    viewer: &str,
    limit: usize,
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(page)?)?,
        OutputFormat::Text => {
            for msg in page {
                writeln!(out, "{}", format_message(msg, viewer))?;
            }
            if page.len() < limit {
                writeln!(out, "(beginning of conversation)")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
