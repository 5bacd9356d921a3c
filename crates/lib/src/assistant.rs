//! Assistant turn: compose the system prompt, call the completion backend once, return text.
//!
//! [`Assistant::answer`] keeps the typed error; [`Assistant::reply`] is the boundary used by the
//! chat surfaces and never fails.

use crate::config::{self, Config};
use crate::context::ContextSnapshot;
use crate::error::ChatError;
use crate::llm::{ChatCompletionRequest, ChatMessage, CompletionBackend, OpenAiClient};
use crate::prompt::compose_system_prompt;

/// Returned when the call succeeds but carries no completion text.
pub const NO_RESPONSE_FALLBACK: &str = "Sorry, I could not get a response.";

/// Model and sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            model: config::DEFAULT_MODEL.to_string(),
            max_tokens: config::DEFAULT_MAX_TOKENS,
            temperature: config::DEFAULT_TEMPERATURE,
        }
    }
}

impl From<&config::AssistantConfig> for RequestSettings {
    fn from(c: &config::AssistantConfig) -> Self {
        let model = c.model.trim();
        let model = if model.is_empty() {
            log::warn!("assistant: configured model was empty, using {}", config::DEFAULT_MODEL);
            config::DEFAULT_MODEL
        } else {
            model
        };
        Self {
            model: model.to_string(),
            max_tokens: c.max_tokens,
            temperature: c.temperature,
        }
    }
}

/// Prompt composer and remote caller.
pub struct Assistant<B: CompletionBackend> {
    backend: B,
    api_key: Option<String>,
    settings: RequestSettings,
}

impl Assistant<OpenAiClient> {
    /// OpenAI-backed assistant from config. The key is resolved here (env over config file).
    pub fn from_config(config: &Config) -> Self {
        let backend = OpenAiClient::new(Some(config.assistant.base_url.clone()));
        let api_key = config::resolve_api_key(config);
        if api_key.is_none() {
            log::warn!("assistant: no API key configured; replies will ask for {}", config::API_KEY_ENV);
        }
        Self::new(backend, api_key, RequestSettings::from(&config.assistant))
    }
}

impl<B: CompletionBackend> Assistant<B> {
    pub fn new(backend: B, api_key: Option<String>, settings: RequestSettings) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self {
            backend,
            api_key,
            settings,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn settings(&self) -> &RequestSettings {
        &self.settings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Request payload for one turn: the composed system prompt, then the user's text.
    pub fn build_request(&self, user_text: &str, context: &ContextSnapshot) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage::system(compose_system_prompt(context)),
                ChatMessage::user(user_text),
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// One assistant turn. No retries; a missing key returns before any network call.
    pub async fn answer(&self, user_text: &str, context: &ContextSnapshot) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;
        let request = self.build_request(user_text, context);
        log::info!("assistant: using model {}", request.model);
        let content = self.backend.complete(api_key, &request).await?;
        Ok(content.unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string()))
    }

    /// Like [`answer`](Self::answer), with errors rendered as warning-prefixed text.
    pub async fn reply(&self, user_text: &str, context: &ContextSnapshot) -> String {
        match self.answer(user_text, context).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("assistant: {}", e);
                e.user_message()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Canned outcome for the mock backend.
    pub(crate) enum Canned {
        Text(Option<String>),
        Api(String),
        Decode,
    }

    /// Backend that records every request and replies with a canned outcome.
    pub(crate) struct MockBackend {
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<(String, ChatCompletionRequest)>>,
        /// Value of `pending` (when watched) at the moment each call ran.
        pub pending_seen: Mutex<Vec<bool>>,
        pending: Option<Arc<AtomicBool>>,
        canned: Canned,
    }

    impl MockBackend {
        pub(crate) fn new(canned: Canned) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                pending_seen: Mutex::new(Vec::new()),
                pending: None,
                canned,
            }
        }

        /// Read `pending` during every call and record it in `pending_seen`.
        pub(crate) fn watching(mut self, pending: Arc<AtomicBool>) -> Self {
            self.pending = Some(pending);
            self
        }

        pub(crate) fn text(s: &str) -> Self {
            Self::new(Canned::Text(Some(s.to_string())))
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionBackend for MockBackend {
        async fn complete(
            &self,
            api_key: &str,
            request: &ChatCompletionRequest,
        ) -> Result<Option<String>, ChatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(pending) = &self.pending {
                self.pending_seen
                    .lock()
                    .unwrap()
                    .push(pending.load(Ordering::SeqCst));
            }
            self.requests
                .lock()
                .unwrap()
                .push((api_key.to_string(), request.clone()));
            match &self.canned {
                Canned::Text(t) => Ok(t.clone()),
                Canned::Api(m) => Err(ChatError::Api(m.clone())),
                Canned::Decode => Err(ChatError::Decode("bad body".to_string())),
            }
        }
    }

    fn assistant(canned: Canned, key: Option<&str>) -> Assistant<MockBackend> {
        Assistant::new(
            MockBackend::new(canned),
            key.map(str::to_string),
            RequestSettings::default(),
        )
    }

    #[tokio::test]
    async fn missing_key_makes_no_call() {
        let a = assistant(Canned::Text(Some("unused".into())), None);
        let reply = a.reply("How is the air?", &ContextSnapshot::default()).await;
        assert_eq!(
            reply,
            "⚠️ OpenAI API key not configured. Please add OPENAI_API_KEY to your environment variables."
        );
        assert_eq!(a.backend().call_count(), 0);
        assert!(matches!(
            a.answer("x", &ContextSnapshot::default()).await,
            Err(ChatError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn blank_key_counts_as_missing() {
        let a = assistant(Canned::Text(None), Some("   "));
        assert!(!a.has_api_key());
        let _ = a.reply("hi", &ContextSnapshot::default()).await;
        assert_eq!(a.backend().call_count(), 0);
    }

    #[tokio::test]
    async fn success_returns_content() {
        let a = assistant(Canned::Text(Some("Hello".into())), Some("sk-test"));
        let reply = a.reply("hi", &ContextSnapshot::default()).await;
        assert_eq!(reply, "Hello");
        assert_eq!(a.backend().call_count(), 1);
    }

    #[tokio::test]
    async fn no_completion_returns_fallback() {
        let a = assistant(Canned::Text(None), Some("sk-test"));
        assert_eq!(
            a.reply("hi", &ContextSnapshot::default()).await,
            "Sorry, I could not get a response."
        );
    }

    #[tokio::test]
    async fn api_error_is_rendered_with_message() {
        let a = assistant(Canned::Api("X".into()), Some("sk-test"));
        let reply = a.reply("hi", &ContextSnapshot::default()).await;
        assert!(reply.contains('X'));
        assert!(reply.starts_with("⚠️"));
    }

    #[tokio::test]
    async fn decode_error_is_generic() {
        let a = assistant(Canned::Decode, Some("sk-test"));
        assert_eq!(
            a.reply("hi", &ContextSnapshot::default()).await,
            "⚠️ Error: Could not contact AI service"
        );
    }

    #[tokio::test]
    async fn request_carries_prompt_user_text_and_settings() {
        let a = assistant(Canned::Text(Some("ok".into())), Some("sk-test"));
        let ctx = ContextSnapshot::default().with_location("MG Road");
        a.answer("Is it profitable?", &ctx).await.unwrap();

        let requests = a.backend().requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (key, req) = &requests[0];
        assert_eq!(key, "sk-test");
        assert_eq!(req.model, "gpt-3.5-turbo");
        assert_eq!(req.max_tokens, 800);
        assert!((req.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(req.messages.len(), 2);
        assert!(matches!(req.messages[0], ChatMessage::System { .. }));
        assert!(req.messages[0].content().contains("📍 Location: MG Road"));
        assert_eq!(req.messages[1], ChatMessage::user("Is it profitable?"));
    }

    #[test]
    fn empty_configured_model_falls_back() {
        let mut c = config::AssistantConfig::default();
        c.model = "  ".to_string();
        assert_eq!(RequestSettings::from(&c).model, config::DEFAULT_MODEL);
    }
}
