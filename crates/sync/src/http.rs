// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway HTTP client.

use std::time::Duration;

use commz_core::{Conversation, Message, MessageDraft, Profile};
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pull::{PullClient, PullError, PullFuture, PullResult};
use crate::transport::AUTH_COOKIE;

impl From<reqwest::Error> for PullError {
    fn from(e: reqwest::Error) -> Self {
        PullError::Transport(e.to_string())
    }
}

/// Error body the gateway services return.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct DirectChatBody<'a> {
    message: &'a str,
    receiver: &'a str,
}

#[derive(Serialize)]
struct GroupBody<'a> {
    name: &'a str,
    members: &'a [String],
}

#[derive(Deserialize)]
struct UploadedMedia {
    name: String,
}

/// [`PullClient`] over the gateway's HTTP routes.
#[derive(Debug, Clone)]
pub struct HttpPullClient {
    client: Client,
    /// Gateway base URL without a trailing slash.
    base_url: String,
    token: Option<String>,
}

impl HttpPullClient {
    /// Create a client for the gateway at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> PullResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(COOKIE, format!("{AUTH_COOKIE}={token}")),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PullResult<T> {
        debug!(path, "GET");
        let response = self.authed(self.client.get(self.url(path))).send().await?;
        handle_response(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PullResult<T> {
        let response = self.authed(request).send().await?;
        handle_response(response).await
    }
}

/// Parses a JSON body or turns a failure status into [`PullError::Request`].
async fn handle_response<T: DeserializeOwned>(response: Response) -> PullResult<T> {
    let response = check_status(response).await?;
    response
        .json()
        .await
        .map_err(|e| PullError::Decode(e.to_string()))
}

async fn check_status(response: Response) -> PullResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.is_empty());
    Err(PullError::Request {
        status: status.as_u16(),
        message,
    })
}

impl PullClient for HttpPullClient {
    fn list_conversations(&self) -> PullFuture<'_, Vec<Conversation>> {
        Box::pin(async move {
            let conversations: Option<Vec<Conversation>> = self.get_json("chat").await?;
            Ok(conversations.unwrap_or_default())
        })
    }

    fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
        offset: usize,
    ) -> PullFuture<'_, Vec<Message>> {
        let path = format!("chat/{chat_id}/messages?limit={limit}&offset={offset}");
        Box::pin(async move {
            let page: Option<Vec<Message>> = self.get_json(&path).await?;
            Ok(page.unwrap_or_default())
        })
    }

    fn send_message(&self, chat_id: &str, draft: &MessageDraft) -> PullFuture<'_, Message> {
        let request = self
            .client
            .post(self.url(&format!("chat/{chat_id}/messages")))
            .json(draft);
        Box::pin(self.send_json(request))
    }

    fn mark_read(&self, message_id: &str) -> PullFuture<'_, Message> {
        let path = format!("chat/messages/{message_id}/read");
        Box::pin(async move { self.get_json(&path).await })
    }

    fn delete_message(&self, message_id: &str) -> PullFuture<'_, Message> {
        let request = self
            .client
            .delete(self.url(&format!("chat/messages/{message_id}")));
        Box::pin(self.send_json(request))
    }

    fn create_direct(&self, peer: &str, first_message: &str) -> PullFuture<'_, Conversation> {
        let request = self
            .client
            .post(self.url("chat/direct-chat"))
            .json(&DirectChatBody {
                message: first_message,
                receiver: peer,
            });
        Box::pin(self.send_json(request))
    }

    fn create_group(&self, name: &str, members: &[String]) -> PullFuture<'_, Conversation> {
        let request = self
            .client
            .post(self.url("chat/"))
            .json(&GroupBody { name, members });
        Box::pin(self.send_json(request))
    }

    fn update_group(
        &self,
        chat_id: &str,
        name: &str,
        members: &[String],
    ) -> PullFuture<'_, Conversation> {
        let request = self
            .client
            .put(self.url(&format!("chat/{chat_id}")))
            .json(&GroupBody { name, members });
        Box::pin(self.send_json(request))
    }

    fn delete_group(&self, chat_id: &str) -> PullFuture<'_, ()> {
        let request = self.client.delete(self.url(&format!("chat/{chat_id}")));
        Box::pin(async move {
            let response = self.authed(request).send().await?;
            check_status(response).await?;
            Ok(())
        })
    }

    fn current_user(&self) -> PullFuture<'_, Profile> {
        Box::pin(self.get_json("auth/user"))
    }

    fn list_users(&self) -> PullFuture<'_, Vec<Profile>> {
        Box::pin(self.get_json("auth/users"))
    }

    fn update_profile(&self, profile: &Profile) -> PullFuture<'_, Profile> {
        let request = self.client.put(self.url("auth/user")).json(profile);
        Box::pin(self.send_json(request))
    }

    fn upload_media(&self, bytes: Vec<u8>, content_type: &str) -> PullFuture<'_, String> {
        let request = self
            .client
            .post(self.url("media"))
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        Box::pin(async move {
            let uploaded: UploadedMedia = self.send_json(request).await?;
            Ok(uploaded.name)
        })
    }

    fn fetch_version(&self, service: &str) -> PullFuture<'_, String> {
        let path = if service == "gateway" {
            "version".to_string()
        } else {
            format!("{service}/version")
        };
        Box::pin(async move {
            let response = self.authed(self.client.get(self.url(&path))).send().await?;
            let response = check_status(response).await?;
            let text = response.text().await?;
            Ok(text.trim().to_string())
        })
    }

    fn media_url(&self, reference: &str) -> String {
        self.url(&format!("media/{reference}"))
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
