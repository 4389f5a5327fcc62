// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use crate::channel::ChannelConfig;
use crate::pull::{PullError, PullFuture, PullResult};
use crate::test_helpers::{conversation, message, push_json, MockRemote, MockSession, RecordingTimer};
use commz_core::{Message, Profile};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::timeout;

const ME: &str = "alice";
const WAIT: Duration = Duration::from_secs(5);

/// Pull client answering from canned responses.
#[derive(Default)]
struct MockPull {
    lists: Mutex<VecDeque<Vec<Conversation>>>,
    calls: Mutex<Vec<String>>,
}

impl MockPull {
    fn with_lists(lists: Vec<Vec<Conversation>>) -> Arc<Self> {
        Arc::new(MockPull {
            lists: Mutex::new(lists.into()),
            calls: Mutex::default(),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn ready<'a, T: Send + 'a>(result: PullResult<T>) -> PullFuture<'a, T> {
    Box::pin(async move { result })
}

fn unsupported<'a, T: Send + 'a>() -> PullFuture<'a, T> {
    ready(Err(PullError::Transport("unsupported".into())))
}

impl PullClient for MockPull {
    fn list_conversations(&self) -> PullFuture<'_, Vec<Conversation>> {
        self.record("list".into());
        let next = self.lists.lock().unwrap().pop_front().unwrap_or_default();
        ready(Ok(next))
    }

    fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
        offset: usize,
    ) -> PullFuture<'_, Vec<Message>> {
        self.record(format!("page {chat_id} {offset}+{limit}"));
        ready(Ok(vec![message("0", chat_id, "bob")]))
    }

    fn send_message(&self, chat_id: &str, draft: &MessageDraft) -> PullFuture<'_, Message> {
        self.record(format!("send {chat_id} {}", draft.content));
        let mut stored = message("m2", chat_id, ME);
        stored.content = draft.content.clone();
        ready(Ok(stored))
    }

    fn mark_read(&self, message_id: &str) -> PullFuture<'_, Message> {
        self.record(format!("read {message_id}"));
        unsupported()
    }

    fn delete_message(&self, _message_id: &str) -> PullFuture<'_, Message> {
        unsupported()
    }

    fn create_direct(&self, peer: &str, _first_message: &str) -> PullFuture<'_, Conversation> {
        self.record(format!("create {peer}"));
        ready(Ok(conversation("42", &[ME, peer])))
    }

    fn create_group(&self, _name: &str, _members: &[String]) -> PullFuture<'_, Conversation> {
        unsupported()
    }

    fn update_group(
        &self,
        _chat_id: &str,
        _name: &str,
        _members: &[String],
    ) -> PullFuture<'_, Conversation> {
        unsupported()
    }

    fn delete_group(&self, _chat_id: &str) -> PullFuture<'_, ()> {
        unsupported()
    }

    fn current_user(&self) -> PullFuture<'_, Profile> {
        unsupported()
    }

    fn list_users(&self) -> PullFuture<'_, Vec<Profile>> {
        unsupported()
    }

    fn update_profile(&self, _profile: &Profile) -> PullFuture<'_, Profile> {
        unsupported()
    }

    fn upload_media(&self, _bytes: Vec<u8>, _content_type: &str) -> PullFuture<'_, String> {
        unsupported()
    }

    fn fetch_version(&self, _service: &str) -> PullFuture<'_, String> {
        unsupported()
    }

    fn media_url(&self, reference: &str) -> String {
        format!("mock://{reference}")
    }
}

struct Harness {
    handle: SessionHandle,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    remote: Arc<MockRemote>,
    pull: Arc<MockPull>,
}

fn start(pull: Arc<MockPull>, remote: Arc<MockRemote>) -> Harness {
    let (channel, channel_events) = ChannelHandle::new(
        remote.transport(),
        RecordingTimer::default(),
        ChannelConfig::new("ws://mock/ws"),
    );
    let (runner, handle, events) = SessionRunner::new(
        Session::new(ME, 30),
        Arc::clone(&pull),
        channel,
        channel_events,
    );
    tokio::spawn(runner.run());
    Harness {
        handle,
        events,
        remote,
        pull,
    }
}

impl Harness {
    /// Waits for an event matching `pred`, skipping others.
    async fn wait_for(&mut self, pred: impl Fn(&SessionEvent) -> bool) -> SessionEvent {
        loop {
            let event = timeout(WAIT, self.events.recv()).await.unwrap().unwrap();
            if pred(&event) {
                return event;
            }
        }
    }

    async fn wait_changed(&mut self) {
        self.wait_for(|e| *e == SessionEvent::Changed).await;
    }
}

fn chat(id: &str, messages: &[&str]) -> Conversation {
    let mut conv = conversation(id, &[ME, "bob"]);
    conv.messages = messages.iter().map(|m| message(m, id, "bob")).collect();
    conv
}

#[tokio::test]
async fn start_refreshes_and_connects() {
    let mut h = start(
        MockPull::with_lists(vec![vec![chat("7", &["1"])]]),
        MockRemote::new(),
    );
    h.wait_changed().await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.conversations.len(), 1);
    assert_eq!(h.pull.calls(), vec!["list"]);
    assert_eq!(h.remote.urls(), vec!["ws://mock/ws"]);
    h.handle.shutdown().unwrap();
}

#[tokio::test]
async fn push_for_unknown_conversation_refreshes() {
    let remote = MockRemote::new();
    remote.script(MockSession::holding(vec![push_json(&message("1", "9", "bob"))]));
    let mut h = start(
        MockPull::with_lists(vec![vec![], vec![chat("9", &["1"])]]),
        remote,
    );

    timeout(WAIT, async {
        loop {
            h.wait_changed().await;
            let snapshot = h.handle.snapshot().await.unwrap();
            if !snapshot.conversations.is_empty() {
                assert_eq!(snapshot.conversations[0].messages.len(), 1);
                break;
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(h.pull.calls(), vec!["list", "list"]);
}

#[tokio::test]
async fn submit_is_confirmed_in_place() {
    let mut h = start(
        MockPull::with_lists(vec![vec![chat("7", &["1"])]]),
        MockRemote::new(),
    );
    h.wait_changed().await;
    h.handle.select(Target::Conversation("7".into())).await.unwrap();

    let local_id = h.handle.submit(MessageDraft::text("hello")).await.unwrap();
    let sent = h.wait_for(|e| matches!(e, SessionEvent::Sent { .. })).await;
    let SessionEvent::Sent {
        local_id: confirmed,
        message,
    } = sent
    else {
        panic!("expected a sent event");
    };
    assert_eq!(confirmed, local_id);
    assert_eq!(message.id, "m2");

    let snapshot = h.handle.snapshot().await.unwrap();
    let conv = snapshot.selected_conversation().unwrap();
    assert_eq!(conv.messages.len(), 2);
    assert_eq!(conv.messages[1].id, "m2");
    assert_eq!(snapshot.unconfirmed_sends, 0);
    assert!(h.pull.calls().contains(&"send 7 hello".to_string()));
}

#[tokio::test]
async fn first_message_to_new_peer_creates_then_sends() {
    let mut h = start(MockPull::with_lists(vec![vec![]]), MockRemote::new());
    h.wait_changed().await;

    h.handle.open_direct("bob").unwrap();
    h.handle.submit(MessageDraft::text("hi")).await.unwrap();
    h.wait_for(|e| matches!(e, SessionEvent::Sent { .. })).await;

    let calls = h.pull.calls();
    assert_eq!(calls, vec!["list", "create bob", "send 42 hi"]);
    let snapshot = h.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.selected, Some(Target::Conversation("42".into())));
}

#[tokio::test]
async fn edit_goes_out_on_push_channel() {
    let mut h = start(
        MockPull::with_lists(vec![vec![chat("7", &["1"])]]),
        MockRemote::new(),
    );
    h.wait_changed().await;
    h.handle.select(Target::Conversation("7".into())).await.unwrap();

    // Frames written before the channel is open are dropped, so keep trying
    timeout(WAIT, async {
        loop {
            h.handle.edit_message("1", "fixed").await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            if !h.remote.sent().is_empty() {
                break;
            }
        }
    })
    .await
    .unwrap();

    let frame: serde_json::Value = serde_json::from_str(&h.remote.sent()[0]).unwrap();
    assert_eq!(frame["content"], "fixed");
    assert_eq!(frame["id"], "1");
    assert_eq!(frame["chat_id"], "7");
}

#[tokio::test]
async fn page_request_uses_confirmed_offset() {
    let mut h = start(
        MockPull::with_lists(vec![vec![chat("7", &["1", "2"])]]),
        MockRemote::new(),
    );
    h.wait_changed().await;
    h.handle.select(Target::Conversation("7".into())).await.unwrap();

    h.handle.load_older().unwrap();
    let loaded = h
        .wait_for(|e| matches!(e, SessionEvent::PageLoaded { .. }))
        .await;

    assert_eq!(
        loaded,
        SessionEvent::PageLoaded {
            chat_id: "7".into(),
            inserted: 1,
            exhausted: true,
        }
    );
    assert!(h.pull.calls().contains(&"page 7 2+30".to_string()));
}

#[tokio::test]
async fn failed_mark_read_surfaces_notice() {
    let mut h = start(
        MockPull::with_lists(vec![vec![chat("7", &["1"])]]),
        MockRemote::new(),
    );
    h.wait_changed().await;
    h.handle.select(Target::Conversation("7".into())).await.unwrap();

    h.handle.view_message("1").unwrap();
    h.wait_for(|e| matches!(e, SessionEvent::Notice(_))).await;

    let snapshot = h.handle.snapshot().await.unwrap();
    assert!(!snapshot.conversations[0].messages[0].read);
}

#[tokio::test]
async fn handle_fails_after_shutdown() {
    let h = start(MockPull::with_lists(vec![]), MockRemote::new());
    h.handle.shutdown().unwrap();

    let result = timeout(WAIT, async {
        loop {
            if let Err(e) = h.handle.snapshot().await {
                return e;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert_eq!(result, SessionError::Closed);
}
