// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal colors for help text and chat output.
//!
//! Respects environment variables:
//! - `NO_COLOR=1`: Disables colors
//! - `COLOR=1`: Forces colors even without TTY

use std::io::IsTerminal;

/// ANSI 256-color codes.
pub mod codes {
    /// Section headers and conversation titles: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and sender names: light grey
    pub const LITERAL: u8 = 250;
    /// Timestamps and hints: medium grey
    pub const CONTEXT: u8 = 245;
    /// Failed sends and server notices: soft red
    pub const WARNING: u8 = 174;
}

/// Check if colors should be enabled based on TTY and environment variables.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("{}{}{}", fg256(code), text, RESET)
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

pub fn literal(text: &str) -> String {
    paint(codes::LITERAL, text)
}

pub fn context(text: &str) -> String {
    paint(codes::CONTEXT, text)
}

pub fn warning(text: &str) -> String {
    paint(codes::WARNING, text)
}

/// Colorize an examples help block.
///
/// Lines ending with `:` become headers; in `  command  description` lines
/// the command part is colored as a literal.
pub fn examples(text: &str) -> String {
    if !should_colorize() {
        return text.to_string();
    }

    let mut lines = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];

        if trimmed.ends_with(':') && !trimmed.contains("  ") {
            lines.push(format!("{indent}{}", header(trimmed)));
        } else if let Some(end) = find_description_start(trimmed) {
            lines.push(format!(
                "{indent}{}{}",
                literal(&trimmed[..end]),
                &trimmed[end..]
            ));
        } else {
            lines.push(line.to_string());
        }
    }
    lines.join("\n")
}

/// Find where the description starts (two or more spaces after the command).
fn find_description_start(line: &str) -> Option<usize> {
    let start = line.find("  ")?;
    if line[start..].trim().is_empty() || start == 0 {
        return None;
    }
    Some(start)
}

#[cfg(test)]
#[path = "colors_tests.rs"]
mod tests;
