// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[test]
fn summary_takes_a_chat() {
    let cli = Cli::try_parse_from(["commz", "summary", "7"]).unwrap();
    assert!(matches!(cli.command, Command::Summary { chat } if chat == "7"));
}

#[parameterized(
    rewrite = { "rewrite" },
    fix = { "fix" },
)]
fn text_commands_take_text(name: &str) {
    let cli = Cli::try_parse_from(["commz", name, "teh text"]).unwrap();
    match cli.command {
        Command::Rewrite { text } | Command::Fix { text } => assert_eq!(text, "teh text"),
        _ => unreachable!("parsed {name} as another command"),
    }
}

#[parameterized(
    rewrite = { "rewrite" },
    fix = { "fix" },
)]
fn text_commands_reject_blank_text(name: &str) {
    assert!(Cli::try_parse_from(["commz", name, " "]).is_err());
}
