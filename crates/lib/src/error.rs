//! Errors from a single assistant turn.
//!
//! None of these reach the host: the chat boundary renders them as an assistant message
//! through [`ChatError::user_message`].

/// Prefix on every error rendered into the conversation.
pub const WARNING_MARKER: &str = "⚠️";

/// Fallback when the remote error body carries no message.
pub const GENERIC_API_ERROR: &str = "OpenAI API error";

const GENERIC_CONTACT_ERROR: &str = "Could not contact AI service";

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("OpenAI API key not configured. Please add OPENAI_API_KEY to your environment variables.")]
    MissingApiKey,
    #[error("{0}")]
    Api(String),
    #[error("chat request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid chat response: {0}")]
    Decode(String),
}

impl ChatError {
    /// Text shown in the conversation for this error.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::MissingApiKey => format!("{} {}", WARNING_MARKER, self),
            ChatError::Api(msg) => format!("{} Error: {}", WARNING_MARKER, msg),
            ChatError::Request(_) | ChatError::Decode(_) => contact_failure_message(),
        }
    }
}

/// Text shown when the service could not be reached or answered garbage.
pub fn contact_failure_message() -> String {
    format!("{} Error: {}", WARNING_MARKER, GENERIC_CONTACT_ERROR)
}
