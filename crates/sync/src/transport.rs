// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Text-frame connections to the gateway.
//!
//! Both the push channel and every AI stream talk through a [`Transport`].
//! Frames stay raw strings here; decoding happens in the layer above, so one
//! undecodable frame never tears down a connection.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{header::COOKIE, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Name of the cookie carrying the auth token.
pub const AUTH_COOKIE: &str = "commz-token";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The handshake could not be built or was refused.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// There is no open connection.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// A bidirectional text-frame connection.
///
/// Tests swap in scripted implementations.
pub trait Transport: Send + Sync {
    fn connect(&mut self, url: &str) -> BoxFuture<'_, ()>;

    fn disconnect(&mut self) -> BoxFuture<'_, ()>;

    fn send(&mut self, text: String) -> BoxFuture<'_, ()>;

    /// Next text frame. `None` once the peer closed the connection.
    fn recv(&mut self) -> BoxFuture<'_, Option<String>>;

    fn is_connected(&self) -> bool;
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// [`Transport`] over tokio-tungstenite.
///
/// Any failed send or receive drops the socket, so `is_connected` turns false
/// and the owner reconnects.
#[derive(Default)]
pub struct WebSocketTransport {
    token: Option<String>,
    writer: Option<SplitSink<Socket, Message>>,
    reader: Option<SplitStream<Socket>>,
}

impl WebSocketTransport {
    /// A transport without credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that presents `token` as the auth cookie on every handshake.
    pub fn with_token(token: Option<String>) -> Self {
        WebSocketTransport {
            token,
            ..Self::default()
        }
    }

    fn drop_socket(&mut self) {
        self.writer = None;
        self.reader = None;
    }
}

/// Builds the handshake for `url`, attaching the auth cookie when present.
pub(crate) fn handshake(url: &str, token: Option<&str>) -> TransportResult<Request> {
    let failed = |e: &dyn std::fmt::Display| TransportError::ConnectionFailed(e.to_string());
    let mut request = url.into_client_request().map_err(|e| failed(&e))?;
    if let Some(token) = token {
        let cookie = HeaderValue::from_str(&format!("{AUTH_COOKIE}={token}")).map_err(|e| failed(&e))?;
        request.headers_mut().insert(COOKIE, cookie);
    }
    Ok(request)
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, url: &str) -> BoxFuture<'_, ()> {
        let request = handshake(url, self.token.as_deref());
        Box::pin(async move {
            let (socket, _) = tokio_tungstenite::connect_async(request?)
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
            let (writer, reader) = socket.split();
            self.writer = Some(writer);
            self.reader = Some(reader);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if let Some(mut writer) = self.writer.take() {
                let _ = writer.close().await;
            }
            self.reader = None;
            Ok(())
        })
    }

    fn send(&mut self, text: String) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            let writer = self.writer.as_mut().ok_or(TransportError::ConnectionClosed)?;
            if let Err(e) = writer.send(Message::Text(text.into())).await {
                self.drop_socket();
                return Err(TransportError::SendFailed(e.to_string()));
            }
            Ok(())
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, Option<String>> {
        Box::pin(async move {
            let reader = self.reader.as_mut().ok_or(TransportError::ConnectionClosed)?;
            let outcome = loop {
                match reader.next().await {
                    Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                    Some(Ok(Message::Close(_))) | None => break Ok(None),
                    // Ping/pong and binary frames carry nothing for us
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break Err(TransportError::ReceiveFailed(e.to_string())),
                }
            };
            self.drop_socket();
            outcome
        })
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some() && self.reader.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
