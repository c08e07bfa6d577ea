//! Chat sessions, messages and the streaming response assembler.

pub mod manager;
pub mod stream;

pub use manager::{ChatSessionManager, PAGE_SIZE};
pub use stream::{CliStreamSink, NullStreamSink, StreamAssembler, StreamSink, consume_stream};

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

/// One rendered chat message. Insertion order is display order, oldest
/// first. Ids are client-generated for local placeholders and
/// backend-assigned for history rows; the only reconciliation is
/// "replace placeholder by id".
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }

    fn assistant_with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            text: text.into(),
        }
    }
}

/// A conversation known to the backend. Exactly one session is active at a
/// time; its id is persisted so the selection survives restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: String,
    pub last_updated: Option<DateTime<Utc>>,
}
