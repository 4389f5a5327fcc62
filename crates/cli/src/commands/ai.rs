// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use commz_core::{StreamKind, StreamRequest};
use commz_sync::{AiStream, PullClient, Transport};
use tracing::debug;

use super::Context;
use crate::error::{Error, Result};

/// Streams a summary of conversation `chat`.
pub async fn summary(ctx: &Context, chat: &str) -> Result<()> {
    let conversations = ctx.pull.list_conversations().await?;
    let conv = conversations
        .into_iter()
        .find(|c| c.has_id(chat))
        .ok_or_else(|| Error::ConversationNotFound(chat.to_string()))?;
    debug!(chat, messages = conv.messages.len(), "summarizing");
    let stream = ctx
        .aggregator()
        .stream(
            StreamKind::Summarization,
            &StreamRequest::Conversation(conv),
            Some(chat.to_string()),
        )
        .await?;
    print_stream(stream, &mut std::io::stdout()).await
}

/// Streams a rewrite or fix of `text`.
pub async fn transform(ctx: &Context, kind: StreamKind, text: &str) -> Result<()> {
    let stream = ctx
        .aggregator()
        .stream(kind, &StreamRequest::text(text), None)
        .await?;
    print_stream(stream, &mut std::io::stdout()).await
}

/// Writes fragments as they arrive, ending with a newline.
pub(crate) async fn print_stream<T: Transport>(
    mut stream: AiStream<T>,
    out: &mut impl Write,
) -> Result<()> {
    let mut wrote = false;
    while let Some(fragment) = stream.next().await {
        match fragment {
            Ok(text) => {
                write!(out, "{text}")?;
                out.flush()?;
                wrote = true;
            }
            Err(e) => {
                if wrote {
                    writeln!(out)?;
                }
                return Err(e.into());
            }
        }
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
#[path = "ai_tests.rs"]
mod tests;
