use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RequestFailure;
use crate::state::Turn;

/// Something that can turn a transcript into the assistant's next answer.
///
/// The session only talks to this trait, so tests can drive it without a
/// server.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the full transcript, oldest first, and return the answer text.
    async fn complete(&self, messages: &[Turn]) -> Result<String, RequestFailure>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Turn],
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: String,
}

#[derive(Clone)]
pub struct HttpChatBackend {
    client: Client,
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Like [`HttpChatBackend::new`] but every request gives up after `timeout`.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, RequestFailure> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn complete(&self, messages: &[Turn]) -> Result<String, RequestFailure> {
        debug!(endpoint = %self.endpoint, messages = messages.len(), "posting transcript");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestFailure::Status { status, body });
        }

        // Read as text first so a bad body surfaces as MalformedBody, not Network
        let body = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&body)?;
        Ok(chat_response.answer)
    }
}
