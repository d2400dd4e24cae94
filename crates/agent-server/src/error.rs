//! API Errors
//!
//! Every failure leaves the server as `{error, code}` JSON with a status
//! that tells the client whether retrying makes sense.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use agent_core::AgentError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Agent not initialized. Check the LLM provider configuration.")]
    AgentUnavailable,

    #[error("Conversation '{0}' not found")]
    ConversationNotFound(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::AgentUnavailable | Self::Agent(AgentError::ProviderUnavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::ConversationNotFound(_) => StatusCode::NOT_FOUND,
            Self::Agent(AgentError::Provider(_)) => StatusCode::BAD_GATEWAY,
            Self::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::AgentUnavailable => "AGENT_UNAVAILABLE",
            Self::ConversationNotFound(_) => "CONVERSATION_NOT_FOUND",
            Self::Agent(AgentError::ProviderUnavailable(_)) => "PROVIDER_UNAVAILABLE",
            Self::Agent(AgentError::Provider(_)) => "PROVIDER_ERROR",
            Self::Agent(_) => "AGENT_ERROR",
        }
    }

    /// Message safe to show to a client
    fn public_message(&self) -> String {
        match self {
            Self::Agent(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Agent(err) = &self {
            tracing::error!("Agent error: {}", err);
        }

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::InvalidRequest("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST"),
            (ApiError::AgentUnavailable, StatusCode::SERVICE_UNAVAILABLE, "AGENT_UNAVAILABLE"),
            (ApiError::ConversationNotFound("c".into()), StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND"),
            (
                AgentError::ProviderUnavailable("down".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
                "PROVIDER_UNAVAILABLE",
            ),
            (AgentError::Provider("400".into()).into(), StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
            (AgentError::Session("poisoned".into()).into(), StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status, "{err}");
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_agent_errors_hide_detail() {
        let err = ApiError::from(AgentError::Provider("secret upstream body".into()));
        assert!(!err.public_message().contains("secret"));
    }
}
