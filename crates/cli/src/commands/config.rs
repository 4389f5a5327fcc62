// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use commz_sync::ClientConfig;

use super::load_config;
use crate::cli::ConfigCommand;
use crate::error::{Error, Result};

const REDACTED: &str = "<redacted>";

/// Execute a config subcommand.
pub fn run(cmd: ConfigCommand, config_path: Option<&Path>, token: Option<String>) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let config = load_config(config_path, token)?;
            print!("{}", render(&config)?);
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", resolve_path(config_path)?.display());
            Ok(())
        }
        ConfigCommand::Init { gateway, force } => {
            let path = resolve_path(config_path)?;
            init(&path, gateway, force)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

fn resolve_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => ClientConfig::default_path().ok_or(Error::NoConfigDir),
    }
}

/// TOML text of `config` with the token hidden.
pub(crate) fn render(config: &ClientConfig) -> Result<String> {
    let mut shown = config.clone();
    if shown.token.is_some() {
        shown.token = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown).map_err(|e| Error::Config(e.into()))
}

/// Writes a default config file to `path`.
pub(crate) fn init(path: &Path, gateway: Option<String>, force: bool) -> Result<ClientConfig> {
    if path.exists() && !force {
        return Err(Error::ConfigExists(path.display().to_string()));
    }
    let mut config = ClientConfig::default();
    if let Some(gateway) = gateway {
        config.gateway_url = gateway;
    }
    config.validate()?;
    config.save_to(path)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
