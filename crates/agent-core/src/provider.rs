//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for all LLM gateways (Anthropic, Ollama, ...)
//! allowing the agent loop to work with any backend without code changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{GenerationOptions, LlmProvider};
//!
//! let completion = provider
//!     .complete(system_prompt, conversation.turns(), &registry.schemas(), &options)
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::Turn;
use crate::tool::{ToolCall, ToolSchema};

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "claude-sonnet-4-5-20250929", "llama3.2")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 {
    0.7
}
const fn default_max_tokens() -> u32 {
    4096
}

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// What the model asked for
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelResponse {
    /// Terminal text reply
    Final(String),

    /// One or more tool calls, possibly with provisional text
    ToolRequests {
        calls: Vec<ToolCall>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
}

impl ModelResponse {
    pub fn tool_requests(calls: Vec<ToolCall>) -> Self {
        Self::ToolRequests { calls, text: None }
    }

    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// Final text or tool requests
    pub response: ModelResponse,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,
}

impl Completion {
    pub fn new(response: ModelResponse, model: impl Into<String>) -> Self {
        Self {
            response,
            model: model.into(),
            usage: None,
        }
    }
}

/// Strategy trait for LLM providers
///
/// Implementations perform exactly one request per call and never retry;
/// retry and iteration policy belong to the agent loop.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs and health output
    fn name(&self) -> &str;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Send the full context and return the model's next move
    ///
    /// Transport and auth failures map to [`AgentError::ProviderUnavailable`],
    /// rejected or unparseable exchanges to [`AgentError::Provider`].
    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Turn],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion>;
}

/// Deterministic provider replaying a fixed script of responses
///
/// Useful for offline runs and for exercising the agent loop in tests.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ModelResponse>>>,
    repeat: Option<ModelResponse>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    /// Replay `responses` in order, then fail
    pub fn new(responses: impl IntoIterator<Item = ModelResponse>) -> Self {
        Self::from_results(responses.into_iter().map(Ok))
    }

    /// Replay successes and failures in order
    pub fn from_results(results: impl IntoIterator<Item = Result<ModelResponse>>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            repeat: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Answer every call with the same response, forever
    pub fn repeating(response: ModelResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            repeat: Some(response),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Sleep before answering each call
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `complete` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_response(&self) -> Result<ModelResponse> {
        let next = self
            .script
            .lock()
            .map_err(|_| AgentError::Other("scripted provider lock poisoned".into()))?
            .pop_front();

        match (next, &self.repeat) {
            (Some(result), _) => result,
            (None, Some(response)) => Ok(response.clone()),
            (None, None) => Err(AgentError::ProviderUnavailable(
                "scripted provider has no responses left".into(),
            )),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _history: &[Turn],
        _tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.next_response()?;
        Ok(Completion::new(response, options.model.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 4096);
        assert_eq!(opts.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_scripted_provider_replays_then_fails() {
        let provider = ScriptedProvider::new([
            ModelResponse::tool_requests(vec![ToolCall::new("c1", "get_route", json!({}))]),
            ModelResponse::Final("done".into()),
        ]);
        let opts = GenerationOptions::default();

        let first = provider.complete("", &[], &[], &opts).await.unwrap();
        assert!(!first.response.is_final());
        let second = provider.complete("", &[], &[], &opts).await.unwrap();
        assert_eq!(second.response, ModelResponse::Final("done".into()));

        let err = provider.complete("", &[], &[], &opts).await.unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_provider_repeating() {
        let provider = ScriptedProvider::repeating(ModelResponse::Final("again".into()));
        let opts = GenerationOptions::default();
        for _ in 0..5 {
            let completion = provider.complete("", &[], &[], &opts).await.unwrap();
            assert!(completion.response.is_final());
        }
    }
}
