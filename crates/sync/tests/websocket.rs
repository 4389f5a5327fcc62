// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Push channel and AI streams against an in-process WebSocket server.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use commz_core::{Message as ChatMessage, PushFrame, StreamChunk, StreamKind, StreamRequest, StreamState};
use commz_sync::{
    ChannelConfig, ChannelEvent, ChannelHandle, StreamingAggregator, TokioTimer, Transport,
    WebSocketTransport,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

/// What the test server does with each accepted connection.
#[derive(Clone)]
enum Script {
    /// Sends frames, then closes.
    Send(Vec<String>),
    /// Reads one frame, records it, then sends frames and closes.
    Answer(Vec<String>),
}

struct TestServer {
    port: u16,
    cookies: Arc<Mutex<Vec<Option<String>>>>,
    received: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Serves `scripts` to successive connections; later ones get the last.
    async fn start(scripts: Vec<Script>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let cookies = Arc::new(Mutex::new(Vec::new()));
        let received = Arc::new(Mutex::new(Vec::new()));

        let server_cookies = Arc::clone(&cookies);
        let server_received = Arc::clone(&received);
        tokio::spawn(async move {
            let mut index = 0;
            while let Ok((stream, _)) = listener.accept().await {
                let script = scripts[index.min(scripts.len() - 1)].clone();
                index += 1;
                let cookies = Arc::clone(&server_cookies);
                let received = Arc::clone(&server_received);
                tokio::spawn(async move {
                    let callback = |req: &Request, resp: Response| {
                        let cookie = req
                            .headers()
                            .get("cookie")
                            .map(|v| v.to_str().unwrap().to_string());
                        cookies.lock().unwrap().push(cookie);
                        Ok(resp)
                    };
                    let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
                        .await
                        .unwrap();
                    let frames = match script {
                        Script::Send(frames) => frames,
                        Script::Answer(frames) => {
                            if let Some(Ok(Message::Text(text))) = ws.next().await {
                                received.lock().unwrap().push(text.as_str().to_owned());
                            }
                            frames
                        }
                    };
                    for frame in frames {
                        ws.send(Message::Text(frame.into())).await.unwrap();
                    }
                    let _ = ws.close(None).await;
                });
            }
        });

        TestServer {
            port,
            cookies,
            received,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("ws://127.0.0.1:{}/{}", self.port, path)
    }
}

fn pushed_message() -> String {
    let message = ChatMessage {
        id: "2".into(),
        chat_id: "7".into(),
        sender: "bob".into(),
        content: "hello".into(),
        command: None,
        media: Vec::new(),
        reply_to: None,
        deleted: false,
        read: false,
        timestamp: Utc.timestamp_opt(100, 0).unwrap(),
        sending: false,
        failure: None,
        local_id: None,
    };
    serde_json::to_string(&message).unwrap()
}

#[tokio::test]
async fn transport_sends_token_cookie() {
    let server = TestServer::start(vec![Script::Send(vec!["hi".into()])]).await;

    let mut transport = WebSocketTransport::with_token(Some("secret".into()));
    transport.connect(&server.url("ws")).await.unwrap();
    assert!(transport.is_connected());
    assert_eq!(transport.recv().await.unwrap(), Some("hi".to_string()));
    assert_eq!(transport.recv().await.unwrap(), None);
    assert!(!transport.is_connected());

    assert_eq!(
        server.cookies.lock().unwrap().clone(),
        vec![Some("commz-token=secret".to_string())]
    );
}

#[tokio::test]
async fn channel_delivers_frames_and_reconnects() {
    let server = TestServer::start(vec![Script::Send(vec![
        pushed_message(),
        r#"{"error":"not a member"}"#.to_string(),
    ])])
    .await;

    let mut config = ChannelConfig::new(server.url("ws"));
    config.reconnect_delay = Duration::from_millis(20);
    let (channel, mut events) = ChannelHandle::new(WebSocketTransport::new(), TokioTimer, config);
    assert!(channel.connect());

    let mut seen = Vec::new();
    let mut connects = 0;
    timeout(WAIT, async {
        while connects < 2 {
            let event = events.recv().await.unwrap();
            if event == ChannelEvent::Connected {
                connects += 1;
            }
            seen.push(event);
        }
    })
    .await
    .unwrap();
    channel.shutdown();

    assert_eq!(seen[0], ChannelEvent::Connected);
    assert!(matches!(&seen[1], ChannelEvent::Frame(PushFrame::Message(m)) if m.id == "2"));
    assert_eq!(
        seen[2],
        ChannelEvent::Frame(PushFrame::Error {
            error: "not a member".into()
        })
    );
    assert!(matches!(seen[3], ChannelEvent::Closed { .. }));
    assert_eq!(seen[4], ChannelEvent::Connected);
}

#[tokio::test]
async fn rewrite_streams_over_websocket() {
    let server = TestServer::start(vec![Script::Answer(vec![
        StreamChunk::fragment("Hi").to_json().unwrap(),
        StreamChunk::fragment(" there").to_json().unwrap(),
        StreamChunk::finished().to_json().unwrap(),
    ])])
    .await;

    let aggregator = StreamingAggregator::new(server.url("ai"), || {
        WebSocketTransport::with_token(Some("secret".into()))
    });
    let buffer = timeout(WAIT, async {
        aggregator
            .stream(StreamKind::Rewrite, &StreamRequest::text("hi ther"), None)
            .await
            .unwrap()
            .collect()
            .await
    })
    .await
    .unwrap();

    assert_eq!(buffer.text(), "Hi there");
    assert_eq!(buffer.state(), &StreamState::Completed);
    assert_eq!(
        server.received.lock().unwrap().clone(),
        vec![r#"{"text":"hi ther"}"#.to_string()]
    );
}

#[tokio::test]
async fn unreachable_stream_endpoint_fails() {
    // Bind and drop to get a port nobody listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let aggregator =
        StreamingAggregator::new(format!("ws://127.0.0.1:{port}/ai"), WebSocketTransport::new);

    let buffer = aggregator
        .stream(StreamKind::Fix, &StreamRequest::text("x"), None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(buffer.state(), &StreamState::Failed("Connection failed".into()));
}
