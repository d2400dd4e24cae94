//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider rejected the request or returned something unusable
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable, unauthorized, overloaded or timed out
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments do not match the tool's parameter schema
    #[error("Invalid arguments for '{tool}': field '{field}' {reason}")]
    InvalidArguments {
        tool: String,
        field: String,
        reason: String,
    },

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Shorthand for an [`AgentError::InvalidArguments`]
    pub fn invalid_argument(
        tool: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(_) => {
                "The AI service could not process this request. Please try again.".into()
            }
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::InvalidArguments { field, reason, .. } => {
                format!("Invalid tool input: '{field}' {reason}")
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}
