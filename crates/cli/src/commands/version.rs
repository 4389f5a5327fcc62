// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use commz_sync::PullClient;

use super::Context;
use crate::error::Result;

pub async fn run(ctx: &Context, service: &str) -> Result<()> {
    let version = ctx.pull.fetch_version(service).await?;
    println!("{service} {}", version.trim());
    println!("commz {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
