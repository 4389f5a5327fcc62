// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Token-streamed AI responses.
//!
//! Every call opens its own short-lived connection to the endpoint of its
//! kind, sends one JSON payload and reads `{done, response, done_reason}`
//! frames until a terminal one arrives. Nothing is retried: a failed stream
//! stays failed and the caller starts a new one.

use std::sync::Arc;

use commz_core::{ChunkEffect, StreamBuffer, StreamChunk, StreamKind, StreamRequest};
use futures_util::Stream;
use thiserror::Error;
use tracing::{debug, warn};

use crate::transport::Transport;

/// Reason recorded when the connection cannot be opened.
pub const CONNECTION_FAILED: &str = "Connection failed";

/// Errors ending an AI stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The server reported a failure with `done_reason = "error"`.
    #[error("{0}")]
    Server(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The connection ended before a terminal frame.
    #[error("connection closed before the response finished")]
    ConnectionLost,

    #[error("{0} does not accept this payload")]
    InvalidRequest(StreamKind),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

/// Opens AI streams.
pub struct StreamingAggregator<T> {
    base_url: String,
    make_transport: Arc<dyn Fn() -> T + Send + Sync>,
}

impl<T> Clone for StreamingAggregator<T> {
    fn clone(&self) -> Self {
        StreamingAggregator {
            base_url: self.base_url.clone(),
            make_transport: Arc::clone(&self.make_transport),
        }
    }
}

impl<T: Transport> StreamingAggregator<T> {
    /// Creates an aggregator for endpoints below `base_url`.
    ///
    /// `make_transport` builds a fresh transport for every stream.
    pub fn new(
        base_url: impl Into<String>,
        make_transport: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        StreamingAggregator {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            make_transport: Arc::new(make_transport),
        }
    }

    /// Endpoint URL for `kind`.
    pub fn url(&self, kind: StreamKind) -> String {
        format!("{}/{}", self.base_url, kind.path())
    }

    /// Starts a `kind` stream for `request`.
    ///
    /// `chat_id` names the conversation the result belongs to, if any. A
    /// connection that cannot be opened is not an error here: the returned
    /// stream yields [`StreamError::ConnectionFailed`] first and its buffer
    /// fails with [`CONNECTION_FAILED`].
    pub async fn stream(
        &self,
        kind: StreamKind,
        request: &StreamRequest,
        chat_id: Option<String>,
    ) -> Result<AiStream<T>, StreamError> {
        if !request.accepts(kind) {
            return Err(StreamError::InvalidRequest(kind));
        }
        let payload = request
            .to_json()
            .map_err(|e| StreamError::Encode(e.to_string()))?;

        let mut stream = AiStream {
            transport: None,
            buffer: StreamBuffer::new(chat_id, kind),
            pending_error: None,
        };

        let url = self.url(kind);
        let mut transport = (self.make_transport)();
        if let Err(e) = transport.connect(&url).await {
            warn!(kind = %kind, "AI stream connect failed: {}", e);
            stream.fail_with(StreamError::ConnectionFailed(e.to_string()));
            return Ok(stream);
        }
        if let Err(e) = transport.send(payload).await {
            warn!(kind = %kind, "AI stream request failed: {}", e);
            let _ = transport.disconnect().await;
            stream.fail_with(StreamError::ConnectionFailed(e.to_string()));
            return Ok(stream);
        }
        debug!(kind = %kind, "AI stream opened");
        stream.transport = Some(transport);
        Ok(stream)
    }
}

/// One running AI response.
///
/// Yields text fragments as they arrive and accumulates them in its
/// [`StreamBuffer`]. The sequence is finite and cannot be restarted.
pub struct AiStream<T> {
    transport: Option<T>,
    buffer: StreamBuffer,
    /// Error to report on the next call, before anything is read.
    pending_error: Option<StreamError>,
}

impl<T: Transport> AiStream<T> {
    /// Text and state accumulated so far.
    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    /// Returns the next fragment.
    ///
    /// `None` means the stream ended, cleanly or after an error was returned.
    pub async fn next(&mut self) -> Option<Result<String, StreamError>> {
        if let Some(e) = self.pending_error.take() {
            return Some(Err(e));
        }
        loop {
            if self.buffer.is_terminal() {
                self.close().await;
                return None;
            }
            let transport = self.transport.as_mut()?;
            let frame = match transport.recv().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Some(Err(self.lost().await)),
                Err(e) => {
                    debug!("AI stream receive failed: {}", e);
                    return Some(Err(self.lost().await));
                }
            };
            let chunk = match StreamChunk::from_json(&frame) {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!("skipping undecodable AI frame: {}", e);
                    continue;
                }
            };
            match self.buffer.apply(chunk) {
                ChunkEffect::Fragment(text) => return Some(Ok(text)),
                ChunkEffect::Completed => {
                    debug!(kind = %self.buffer.kind(), "AI stream completed");
                    self.close().await;
                    return None;
                }
                ChunkEffect::Failed(reason) => {
                    warn!(kind = %self.buffer.kind(), "AI stream failed: {}", reason);
                    self.close().await;
                    return Some(Err(StreamError::Server(reason)));
                }
                ChunkEffect::Ignored => continue,
            }
        }
    }

    /// Reads to the end and returns the final buffer.
    pub async fn collect(mut self) -> StreamBuffer {
        while self.next().await.is_some() {}
        self.buffer
    }

    /// Adapts the stream to a [`futures_util::Stream`] of fragments.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, StreamError>>
    where
        T: Send,
    {
        futures_util::stream::unfold(self, |mut stream| async move {
            let item = stream.next().await?;
            Some((item, stream))
        })
    }

    fn fail_with(&mut self, error: StreamError) {
        self.buffer.fail(CONNECTION_FAILED);
        self.pending_error = Some(error);
    }

    async fn lost(&mut self) -> StreamError {
        self.buffer.fail(StreamError::ConnectionLost.to_string());
        self.close().await;
        StreamError::ConnectionLost
    }

    async fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.disconnect().await {
                debug!("closing AI stream failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
