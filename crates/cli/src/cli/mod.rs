// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use commz_sync::DEFAULT_PAGE_SIZE;

use crate::colors;

pub use args::{DraftArgs, Recipient};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "commz")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Terminal client for the commz chat gateway")]
pub struct Cli {
    /// Read configuration from <path> instead of the user config file
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Auth token, overriding COMMZ_TOKEN and the config file
    #[arg(long, global = true, value_name = "token")]
    pub token: Option<String>,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List conversations
    #[command(after_help = colors::examples("\
Examples:
  commz chats              List conversations, most recent first
  commz chats -o json      Print the raw conversation list"))]
    Chats {
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show older messages of a conversation
    #[command(after_help = colors::examples("\
Examples:
  commz history 7              Newest page of conversation 7
  commz history 7 --offset 30  The page before that"))]
    History {
        /// Conversation id
        chat: String,

        /// Number of newest messages to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Messages per page
        #[arg(short = 'n', long, default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,

        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Send a message
    #[command(after_help = colors::examples("\
Examples:
  commz send --chat 7 \"hello\"       Send to conversation 7
  commz send --to bob \"hi\"          Send to bob, creating the chat if needed
  commz send --chat 7 -c guess 42   Send a slash command"))]
    Send {
        #[command(flatten)]
        recipient: Recipient,

        #[command(flatten)]
        draft: DraftArgs,
    },

    /// Follow live messages until interrupted
    Watch {
        /// Only show messages of this conversation, marking them read
        #[arg(long, value_name = "id")]
        chat: Option<String>,
    },

    /// Stream an AI summary of a conversation
    Summary {
        /// Conversation id
        chat: String,
    },

    /// Stream an AI rewrite of some text
    Rewrite {
        #[arg(value_parser = non_empty_string)]
        text: String,
    },

    /// Stream an AI spelling and grammar fix of some text
    Fix {
        #[arg(value_parser = non_empty_string)]
        text: String,
    },

    /// List registered users
    Users {
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Show the version of the gateway or one of its services
    Version {
        #[arg(default_value = "gateway")]
        service: String,
    },

    /// Show or initialize configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the effective configuration (token redacted)
    Show,
    /// Print the config file location
    Path,
    /// Write a default config file
    Init {
        /// Gateway base URL
        #[arg(long)]
        gateway: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
