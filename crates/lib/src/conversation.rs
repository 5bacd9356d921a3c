//! Conversation state: an append-only list of messages and the pending flag.
//!
//! Messages are never edited, reordered or removed. Listeners are told about every appended
//! message and every pending change so the presentation layer can scroll to the latest one and
//! show or hide its typing indicator.

use chrono::{DateTime, Local};

pub const GREETING: &str = "Hello! I'm your location analysis assistant. I can help you understand the data and insights about your selected location. What would you like to know?";

/// One turn. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: String,
    text: String,
    is_user: bool,
    timestamp: DateTime<Local>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, true)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(text, false)
    }

    fn new(text: impl Into<String>, is_user: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            is_user,
            timestamp: Local::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_user(&self) -> bool {
        self.is_user
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Wall-clock time as "HH:MM".
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// What a listener is told about.
#[derive(Debug, Clone, Copy)]
pub enum ConversationEvent<'a> {
    Appended(&'a Message),
    PendingChanged(bool),
}

type Listener = Box<dyn FnMut(ConversationEvent<'_>) + Send>;

/// Ordered message history plus the "response pending" flag.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<Message>,
    pending: bool,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("messages", &self.messages)
            .field("pending", &self.pending)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversation opened by the assistant's greeting.
    pub fn with_greeting() -> Self {
        let mut c = Self::new();
        c.append(Message::assistant(GREETING));
        c
    }

    /// Register a callback run after every append and every pending change.
    pub fn subscribe(&mut self, listener: impl FnMut(ConversationEvent<'_>) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Add a message at the end. No validation.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        if let Some(last) = self.messages.last() {
            for listener in self.listeners.iter_mut() {
                listener(ConversationEvent::Appended(last));
            }
        }
    }

    /// Listeners only hear about actual changes.
    pub fn set_pending(&mut self, pending: bool) {
        if self.pending == pending {
            return;
        }
        self.pending = pending;
        for listener in self.listeners.iter_mut() {
            listener(ConversationEvent::PendingChanged(pending));
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
