// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! commz-sync: Synchronization core of the commz client
//!
//! Keeps one viewer's conversations consistent with the gateway by combining
//! pull requests with a long-lived push channel.
//!
//! # Main Components
//!
//! - [`ChannelHandle`] - push WebSocket with constant-delay reconnect
//! - [`PullClient`] / [`HttpPullClient`] - request/response boundary
//! - [`Session`] - merges pushes, optimistic sends, paging and read state
//! - [`SessionRunner`] - drives a session and carries out its requests
//! - [`StreamingAggregator`] - token-streamed AI responses
//!
//! ```rust,ignore
//! let config = ClientConfig::load()?;
//! let pull = Arc::new(HttpPullClient::new(&config.gateway_url, config.token.clone(), config.request_timeout())?);
//! let (channel, events) = ChannelHandle::new(
//!     WebSocketTransport::with_token(config.token.clone()),
//!     TokioTimer,
//!     ChannelConfig::new(config.push_url()),
//! );
//! let (runner, handle, session_events) =
//!     SessionRunner::new(Session::new(viewer, config.page_size), pull, channel, events);
//! tokio::spawn(runner.run());
//! ```

pub mod channel;
pub mod config;
pub mod http;
mod outbox;
pub mod pager;
pub mod pull;
mod read;
pub mod runner;
pub mod session;
pub mod stream;
pub mod timer;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use channel::{ChannelConfig, ChannelEvent, ChannelHandle, SharedChannelState};
pub use config::{ClientConfig, ConfigError};
pub use http::HttpPullClient;
pub use pager::{PageRequest, DEFAULT_PAGE_SIZE};
pub use pull::{PullClient, PullError, PullResult};
pub use runner::{SessionHandle, SessionRunner, SessionSnapshot};
pub use session::{Completion, Effects, Notice, Request, Session, SessionError, SessionEvent};
pub use stream::{AiStream, StreamError, StreamingAggregator};
pub use timer::{Timer, TokioTimer};
pub use transport::{Transport, TransportError, WebSocketTransport};
