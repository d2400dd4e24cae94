//! Conversation Turns
//!
//! The append-only history format shared by the agent loop, the session
//! store and every LLM provider adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::{ToolCall, ToolResult};

/// Role of a turn's author
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Assistant (LLM) output, text or tool requests
    Assistant,
    /// Tool result fed back to the model
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// Payload of a single turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnContent {
    UserText {
        text: String,
    },
    AssistantText {
        text: String,
    },
    /// Every tool call the model issued in one round
    ToolRequest {
        /// Provisional text the model emitted next to the calls
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
    ToolResult {
        result: ToolResult,
    },
}

/// One atomic unit of conversation history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    #[serde(flatten)]
    pub content: TurnContent,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(content: TurnContent) -> Self {
        Self {
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnContent::UserText { text: text.into() })
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnContent::AssistantText { text: text.into() })
    }

    pub fn tool_request(calls: Vec<ToolCall>, text: Option<String>) -> Self {
        Self::new(TurnContent::ToolRequest { text, calls })
    }

    pub fn tool_result(result: ToolResult) -> Self {
        Self::new(TurnContent::ToolResult { result })
    }

    pub const fn role(&self) -> Role {
        match self.content {
            TurnContent::UserText { .. } => Role::User,
            TurnContent::AssistantText { .. } | TurnContent::ToolRequest { .. } => Role::Assistant,
            TurnContent::ToolResult { .. } => Role::Tool,
        }
    }

    /// Plain text carried by user and assistant text turns
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            TurnContent::UserText { text } | TurnContent::AssistantText { text } => Some(text),
            _ => None,
        }
    }

    /// Correlation ids this turn issues (requests) or answers (results)
    pub fn correlation_ids(&self) -> Vec<&str> {
        match &self.content {
            TurnContent::ToolRequest { calls, .. } => calls.iter().map(|c| c.id.as_str()).collect(),
            TurnContent::ToolResult { result } => vec![result.id.as_str()],
            _ => Vec::new(),
        }
    }

    pub const fn is_user_text(&self) -> bool {
        matches!(self.content, TurnContent::UserText { .. })
    }
}

/// Ordered, append-only turn history
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Drop every turn. Only used by an explicit reset.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Tool call ids requested after the last user turn that have no result yet
    pub fn unanswered_calls(&self) -> Vec<&str> {
        let start = self
            .turns
            .iter()
            .rposition(Turn::is_user_text)
            .unwrap_or(0);
        let mut pending: Vec<&str> = Vec::new();
        for turn in &self.turns[start..] {
            match &turn.content {
                TurnContent::ToolRequest { calls, .. } => {
                    pending.extend(calls.iter().map(|c| c.id.as_str()));
                }
                TurnContent::ToolResult { result } => pending.retain(|id| *id != result.id),
                _ => {}
            }
        }
        pending
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
