//! BizLocate core library — config, analysis context, prompt composition, OpenAI client and
//! conversation state, used by both the CLI and desktop applications.

pub mod assistant;
pub mod chat;
pub mod config;
pub mod context;
pub mod conversation;
pub mod error;
pub mod init;
pub mod llm;
pub mod prompt;

pub use assistant::{Assistant, RequestSettings, NO_RESPONSE_FALLBACK};
pub use chat::{ChatSession, Submission};
pub use context::ContextSnapshot;
pub use conversation::{Conversation, ConversationEvent, Message};
pub use error::ChatError;
