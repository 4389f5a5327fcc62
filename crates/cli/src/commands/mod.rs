// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod ai;
pub mod chats;
pub mod config;
pub mod history;
pub mod send;
pub mod users;
pub mod version;
pub mod watch;

#[cfg(test)]
mod testing;

use std::path::Path;
use std::sync::Arc;

use commz_sync::{
    ChannelConfig, ChannelHandle, ClientConfig, HttpPullClient, PullClient, Session,
    SessionEvent, SessionHandle, SessionRunner, StreamingAggregator, TokioTimer,
    WebSocketTransport,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};

/// Everything a command needs to reach the gateway.
pub struct Context {
    pub config: ClientConfig,
    pub pull: Arc<HttpPullClient>,
}

impl Context {
    /// Loads configuration and builds the pull client.
    ///
    /// `token` overrides both the environment and the config file.
    pub fn load(config_path: Option<&Path>, token: Option<String>) -> Result<Self> {
        let config = load_config(config_path, token)?;
        if config.token.is_none() {
            return Err(Error::MissingToken);
        }
        let pull = HttpPullClient::new(
            &config.gateway_url,
            config.token.clone(),
            config.request_timeout(),
        )?;
        Ok(Context {
            config,
            pull: Arc::new(pull),
        })
    }

    /// Id of the signed-in user.
    pub async fn viewer(&self) -> Result<String> {
        Ok(self.pull.current_user().await?.id)
    }

    pub fn aggregator(&self) -> StreamingAggregator<WebSocketTransport> {
        let token = self.config.token.clone();
        StreamingAggregator::new(self.config.ai_base_url(), move || {
            WebSocketTransport::with_token(token.clone())
        })
    }

    /// Starts a live session: push channel plus initial refresh.
    pub async fn start_session(&self) -> Result<LiveSession> {
        let viewer = self.viewer().await?;
        let mut channel_config = ChannelConfig::new(self.config.push_url());
        channel_config.reconnect_delay = self.config.reconnect_delay();
        let (channel, channel_events) = ChannelHandle::new(
            WebSocketTransport::with_token(self.config.token.clone()),
            TokioTimer,
            channel_config,
        );
        let (runner, handle, events) = SessionRunner::new(
            Session::new(viewer.clone(), self.config.page_size),
            Arc::clone(&self.pull),
            channel,
            channel_events,
        );
        let task = tokio::spawn(runner.run());
        Ok(LiveSession {
            viewer,
            handle,
            events,
            task,
        })
    }
}

/// Loads the config file (or defaults) and applies token overrides.
pub fn load_config(config_path: Option<&Path>, token: Option<String>) -> Result<ClientConfig> {
    let mut config = match config_path {
        Some(path) => {
            let mut config = ClientConfig::load_from(path)?;
            config.apply_token_override(std::env::var(commz_sync::config::TOKEN_ENV).ok());
            config
        }
        None => ClientConfig::load()?,
    };
    config.apply_token_override(token);
    config.validate()?;
    Ok(config)
}

/// A running session and its event stream.
pub struct LiveSession {
    pub viewer: String,
    pub handle: SessionHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    task: JoinHandle<()>,
}

impl LiveSession {
    /// Waits for the first conversation list.
    pub async fn ready(&mut self) -> Result<()> {
        loop {
            match self.events.recv().await {
                Some(SessionEvent::Changed) => return Ok(()),
                Some(SessionEvent::Notice(notice)) => {
                    debug!(?notice, "session notice before first refresh");
                    return Err(Error::Notice(notice_text(&notice)));
                }
                Some(_) => continue,
                None => return Err(Error::SessionEnded),
            }
        }
    }

    /// Stops the runner and waits for it to finish.
    pub async fn stop(self) {
        let _ = self.handle.shutdown();
        let _ = self.task.await;
    }
}

/// Text shown for a session notice.
pub fn notice_text(notice: &commz_sync::Notice) -> String {
    match notice {
        commz_sync::Notice::Server(error) => error.clone(),
        commz_sync::Notice::Request { operation, message } => format!("{operation}: {message}"),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
