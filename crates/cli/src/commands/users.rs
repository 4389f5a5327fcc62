// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use commz_sync::PullClient;

use super::Context;
use crate::cli::OutputFormat;
use crate::display::format_user;
use crate::error::Result;

pub async fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let users = ctx.pull.list_users().await?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&users)?),
        OutputFormat::Text => {
            for user in &users {
                println!("{}", format_user(user));
            }
        }
    }
    Ok(())
}
