// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! commz_cli - terminal front end for the commz chat gateway.
//!
//! Commands are thin wrappers over `commz-sync`: one-shot listings go
//! straight to the pull client, while `send` and `watch` drive a live
//! session with its push channel.

mod cli;
pub mod colors;
mod commands;
mod display;
pub mod error;

pub use cli::{Cli, Command, ConfigCommand, DraftArgs, OutputFormat, Recipient};
pub use error::{Error, Result};

use commz_core::StreamKind;
use tracing_subscriber::EnvFilter;

use commands::Context;

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins over `verbose`; without either only warnings are shown.
pub fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs one parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    let ctx = match cli.command {
        Command::Config(cmd) => return commands::config::run(cmd, config_path, cli.token),
        _ => Context::load(config_path, cli.token)?,
    };

    match cli.command {
        Command::Chats { output } => commands::chats::run(&ctx, output).await,
        Command::History {
            chat,
            offset,
            limit,
            output,
        } => commands::history::run(&ctx, &chat, offset, limit, output).await,
        Command::Send { recipient, draft } => commands::send::run(&ctx, &recipient, &draft).await,
        Command::Watch { chat } => commands::watch::run(&ctx, chat.as_deref()).await,
        Command::Summary { chat } => commands::ai::summary(&ctx, &chat).await,
        Command::Rewrite { text } => commands::ai::transform(&ctx, StreamKind::Rewrite, &text).await,
        Command::Fix { text } => commands::ai::transform(&ctx, StreamKind::Fix, &text).await,
        Command::Users { output } => commands::users::run(&ctx, output).await,
        Command::Version { service } => commands::version::run(&ctx, &service).await,
        // Answered above without a gateway context
        Command::Config(_) => Ok(()),
    }
}
