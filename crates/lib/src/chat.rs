//! Turn-taking: user submission → pending → assistant reply → idle.
//!
//! One turn at a time. While a reply is pending, further submissions are rejected rather than
//! queued. Surfaces that run the remote call elsewhere (the desktop app does it on a worker
//! thread) use [`ChatSession::begin_turn`] and [`ChatSession::complete_turn`] directly.

use crate::assistant::Assistant;
use crate::context::ContextSnapshot;
use crate::conversation::{Conversation, Message};
use crate::llm::CompletionBackend;

/// What a submission turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input or a turn already pending; nothing changed.
    Ignored,
    /// The user turn was appended; send this text to the assistant.
    Send(String),
}

/// Conversation plus the submission rules around it.
#[derive(Debug)]
pub struct ChatSession {
    conversation: Conversation,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_conversation(Conversation::with_greeting())
    }

    pub fn with_conversation(conversation: Conversation) -> Self {
        Self { conversation }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn is_pending(&self) -> bool {
        self.conversation.is_pending()
    }

    /// Whether `input` would be accepted right now.
    pub fn can_submit(&self, input: &str) -> bool {
        !self.is_pending() && !input.trim().is_empty()
    }

    /// Handle raw input. Blank input and input while pending are ignored without touching state.
    /// Anything else, slash-prefixed text included, becomes a user turn.
    pub fn begin_turn(&mut self, input: &str) -> Submission {
        if !self.can_submit(input) {
            return Submission::Ignored;
        }
        let text = input.trim();
        self.conversation.append(Message::user(text));
        self.conversation.set_pending(true);
        Submission::Send(text.to_string())
    }

    /// Append the assistant turn for the pending submission and go back to idle.
    pub fn complete_turn(&mut self, reply: impl Into<String>) {
        if !self.is_pending() {
            log::warn!("chat: reply arrived with no turn pending");
        }
        self.conversation.append(Message::assistant(reply));
        self.conversation.set_pending(false);
    }

    /// Full turn: begin, call the assistant, complete. Returns the assistant message when a
    /// remote turn ran.
    pub async fn submit<B: CompletionBackend>(
        &mut self,
        assistant: &Assistant<B>,
        input: &str,
        context: &ContextSnapshot,
    ) -> Option<&Message> {
        let text = match self.begin_turn(input) {
            Submission::Send(text) => text,
            Submission::Ignored => return None,
        };
        let reply = assistant.reply(&text, context).await;
        self.complete_turn(reply);
        self.conversation.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::tests::{Canned, MockBackend};
    use crate::assistant::RequestSettings;
    use crate::conversation::ConversationEvent;
    use crate::llm::ChatMessage;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn assistant(backend: MockBackend, key: Option<&str>) -> Assistant<MockBackend> {
        Assistant::new(backend, key.map(str::to_string), RequestSettings::default())
    }

    #[tokio::test]
    async fn submit_appends_user_then_assistant() {
        let a = assistant(MockBackend::text("Hello"), Some("sk"));
        let mut chat = ChatSession::new();
        let appended = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&appended);
        chat.conversation_mut()
            .subscribe(move |event| {
                if let ConversationEvent::Appended(m) = event {
                    sink.lock().unwrap().push((m.is_user(), m.text().to_string()));
                }
            });

        let reply = chat
            .submit(&a, "  What about parking?  ", &ContextSnapshot::default())
            .await
            .map(|m| m.text().to_string());
        assert_eq!(reply.as_deref(), Some("Hello"));

        assert_eq!(
            *appended.lock().unwrap(),
            [
                (true, "What about parking?".to_string()),
                (false, "Hello".to_string())
            ]
        );
        assert_eq!(chat.conversation().len(), 3);
        assert!(!chat.is_pending());
        assert_eq!(a.backend().call_count(), 1);
    }

    #[tokio::test]
    async fn blank_input_changes_nothing() {
        let a = assistant(MockBackend::text("Hello"), Some("sk"));
        let mut chat = ChatSession::new();
        let events = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&events);
        chat.conversation_mut()
            .subscribe(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        for input in ["", "   ", "\n\t "] {
            assert!(chat.submit(&a, input, &ContextSnapshot::default()).await.is_none());
        }
        assert_eq!(events.load(Ordering::SeqCst), 0);
        assert_eq!(chat.conversation().len(), 1);
        assert!(!chat.is_pending());
        assert_eq!(a.backend().call_count(), 0);
    }

    #[test]
    fn pending_flag_spans_the_turn() {
        let mut chat = ChatSession::new();
        assert!(!chat.is_pending());
        assert_eq!(chat.begin_turn("hi"), Submission::Send("hi".to_string()));
        assert!(chat.is_pending());
        assert!(chat.conversation().last().unwrap().is_user());
        chat.complete_turn("hello");
        assert!(!chat.is_pending());
        assert!(!chat.conversation().last().unwrap().is_user());
    }

    #[test]
    fn second_submission_while_pending_is_rejected() {
        let mut chat = ChatSession::new();
        assert!(matches!(chat.begin_turn("first"), Submission::Send(_)));
        let len = chat.conversation().len();
        assert_eq!(chat.begin_turn("second"), Submission::Ignored);
        assert_eq!(chat.begin_turn("/new"), Submission::Ignored);
        assert_eq!(chat.conversation().len(), len);
        assert!(!chat.can_submit("third"));
    }

    #[tokio::test]
    async fn missing_key_reply_becomes_assistant_turn() {
        let a = assistant(MockBackend::new(Canned::Text(None)), None);
        let mut chat = ChatSession::new();
        let text = chat
            .submit(&a, "hello", &ContextSnapshot::default())
            .await
            .map(|m| m.text().to_string())
            .unwrap();
        assert!(text.starts_with("⚠️ OpenAI API key not configured"));
        assert_eq!(a.backend().call_count(), 0);
        assert!(!chat.is_pending());
    }

    #[tokio::test]
    async fn api_error_becomes_assistant_turn() {
        let a = assistant(MockBackend::new(Canned::Api("quota exceeded".into())), Some("sk"));
        let mut chat = ChatSession::new();
        chat.submit(&a, "hello", &ContextSnapshot::default()).await;
        let last = chat.conversation().last().unwrap();
        assert!(!last.is_user());
        assert_eq!(last.text(), "⚠️ Error: quota exceeded");
    }

    #[tokio::test]
    async fn pending_is_set_while_backend_runs() {
        let pending = Arc::new(AtomicBool::new(false));
        let a = assistant(
            MockBackend::text("Hello").watching(Arc::clone(&pending)),
            Some("sk"),
        );
        let mut chat = ChatSession::new();
        let flag = Arc::clone(&pending);
        chat.conversation_mut().subscribe(move |event| {
            if let ConversationEvent::PendingChanged(p) = event {
                flag.store(p, Ordering::SeqCst);
            }
        });

        chat.submit(&a, "hi", &ContextSnapshot::default()).await;
        assert_eq!(*a.backend().pending_seen.lock().unwrap(), [true]);
        assert!(!chat.is_pending());
        assert!(!pending.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn slash_text_is_an_ordinary_user_turn() {
        let a = assistant(MockBackend::text("Here is what I can do."), Some("sk"));
        let mut chat = ChatSession::new();
        for input in ["/help", "/new"] {
            chat.submit(&a, input, &ContextSnapshot::default()).await;
        }

        let turns: Vec<(bool, &str)> = chat
            .conversation()
            .messages()
            .iter()
            .map(|m| (m.is_user(), m.text()))
            .collect();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[1], (true, "/help"));
        assert_eq!(turns[2], (false, "Here is what I can do."));
        assert_eq!(turns[3], (true, "/new"));
        assert_eq!(a.backend().call_count(), 2);

        let requests = a.backend().requests.lock().unwrap();
        let user_texts: Vec<&str> = requests
            .iter()
            .filter_map(|(_, r)| match r.messages.last() {
                Some(ChatMessage::User { content }) => Some(content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(user_texts, ["/help", "/new"]);
    }
}
