//! Chat-completion abstraction and the OpenAI client.
//!
//! The assistant talks to a [`CompletionBackend`]; [`OpenAiClient`] is the HTTP implementation.

mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

pub use openai::OpenAiClient;

/// One message of the request payload, tagged by role on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatMessage {
    System { content: String },
    User { content: String },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatMessage::System { content } | ChatMessage::User { content } => content,
        }
    }
}

/// Body of POST /chat/completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Issues one chat completion. `Ok(None)` means the call succeeded but carried no first completion text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        api_key: &str,
        request: &ChatCompletionRequest,
    ) -> Result<Option<String>, ChatError>;
}
