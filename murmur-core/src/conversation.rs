//! Append-only conversation history

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// An ordered, append-only sequence of conversation messages
///
/// A conversation is owned by the caller and passed `&mut` into adapter
/// operations; a completed operation appends exactly one message. Messages
/// are never reordered or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    history: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation seeded with a system message
    pub fn with_system(content: impl Into<crate::message::Content>) -> Self {
        let mut conversation = Self::new();
        conversation.add_message(Message::system(content));
        conversation
    }

    /// Ordered message history
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Append a message
    pub fn add_message(&mut self, message: Message) {
        self.history.push(message);
    }

    /// The most recently appended message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.history.last()
    }

    /// Number of messages in the history
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
