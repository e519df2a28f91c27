//! Data models for conversation history

use serde::{Deserialize, Serialize};

/// Author of a conversation turn
///
/// Serialized lowercase to match OpenAI-style wire roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Reserved for synthesized summary turns at the head of the buffer
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// One message in the conversation, with its cached token estimate
///
/// Turns are immutable once created; the estimate is computed at construction
/// so the buffer's running counter never has to re-tokenize content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub token_count: usize,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>, token_count: usize) -> Self {
        Self {
            role,
            content: content.into(),
            token_count,
        }
    }

    pub fn is_summary(&self) -> bool {
        self.role == Role::System
    }
}
