//! OpenAI chat-completion client (https://api.openai.com/v1 by default).
//!
//! Non-streaming only: POST /chat/completions with a bearer key, first choice's content returned.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::DEFAULT_BASE_URL;
use crate::error::{ChatError, GENERIC_API_ERROR};
use crate::llm::{ChatCompletionRequest, CompletionBackend};

/// Client for an OpenAI-compatible chat-completion endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /chat/completions — non-streaming chat.
    async fn chat_completion(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Option<String>, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);
        log::debug!("openai: POST {} model={}", url, request.model);
        let res = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            log::warn!("openai: request rejected with {}", status);
            return Err(ChatError::Api(api_error_message(&body)));
        }
        let bytes = res.bytes().await?;
        let data: ChatCompletionResponse =
            serde_json::from_slice(&bytes).map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(first_completion(data))
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Option<String>, ChatError> {
        self.chat_completion(api_key, request).await
    }
}

// --- wire types ---

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

fn first_completion(data: ChatCompletionResponse) -> Option<String> {
    data.choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|s| !s.is_empty())
}

/// `error.message` from an error body, or the generic fallback when absent or not JSON.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| GENERIC_API_ERROR.to_string())
}
