//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` over the Anthropic Messages API with
//! native tool use.

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Turn, TurnContent},
    provider::{Completion, GenerationOptions, LlmProvider, ModelResponse, TokenUsage},
    tool::{ToolCall, ToolSchema},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic provider configuration
#[derive(Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,

    /// API root, without the `/v1/...` path
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    /// Read `ANTHROPIC_API_KEY` and `ANTHROPIC_BASE_URL`; `None` without a key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let api_key = lookup("ANTHROPIC_API_KEY").filter(|k| !k.trim().is_empty())?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup("ANTHROPIC_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        Some(config)
    }

    /// Bound whole requests by `timeout`, rounded up to whole seconds
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.timeout_secs = secs.max(1);
        self
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
}

#[derive(Debug, PartialEq, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Serialize)]
struct ApiTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Convert turns to Messages API messages, merging consecutive same-role turns
    fn convert_history(history: &[Turn]) -> Vec<ApiMessage> {
        let mut messages: Vec<ApiMessage> = Vec::new();

        for turn in history {
            let (role, blocks) = match &turn.content {
                TurnContent::UserText { text } => ("user", text_block(text)),
                TurnContent::AssistantText { text } => ("assistant", text_block(text)),
                TurnContent::ToolRequest { text, calls } => {
                    let mut blocks = text.as_deref().map(text_block).unwrap_or_default();
                    blocks.extend(calls.iter().map(|call| ContentBlock::ToolUse {
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: if call.arguments.is_object() {
                            call.arguments.clone()
                        } else {
                            Value::Object(serde_json::Map::new())
                        },
                    }));
                    ("assistant", blocks)
                }
                TurnContent::ToolResult { result } => (
                    "user",
                    vec![ContentBlock::ToolResult {
                        tool_use_id: result.id.clone(),
                        content: result.output.clone(),
                        is_error: !result.success,
                    }],
                ),
            };

            if blocks.is_empty() {
                continue;
            }

            match messages.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => messages.push(ApiMessage { role, content: blocks }),
            }
        }

        messages
    }

    fn build_request<'a>(
        system_prompt: &'a str,
        history: &[Turn],
        tools: &'a [ToolSchema],
        options: &'a GenerationOptions,
    ) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &options.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: system_prompt,
            messages: Self::convert_history(history),
            tools: tools
                .iter()
                .map(|schema| ApiTool {
                    name: &schema.name,
                    description: &schema.description,
                    input_schema: schema.input_schema(),
                })
                .collect(),
        }
    }

    /// Convert a Messages API response to a completion
    fn convert_response(response: MessagesResponse) -> Result<Completion> {
        let mut text = String::new();
        let mut calls = Vec::new();

        for block in response.content {
            match block {
                ContentBlock::Text { text: t } => text.push_str(&t),
                ContentBlock::ToolUse { id, name, input } => calls.push(ToolCall::new(id, name, input)),
                ContentBlock::ToolResult { .. } | ContentBlock::Unsupported => {}
            }
        }

        let stop_reason = response.stop_reason.unwrap_or_default();
        let model_response = match stop_reason.as_str() {
            "tool_use" if !calls.is_empty() => ModelResponse::ToolRequests {
                calls,
                text: Some(text).filter(|t| !t.trim().is_empty()),
            },
            "end_turn" | "stop_sequence" => ModelResponse::Final(text),
            other => {
                return Err(AgentError::Provider(format!(
                    "Unexpected stop reason: {other:?}"
                )));
            }
        };

        let mut completion = Completion::new(model_response, response.model);
        completion.usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });
        Ok(completion)
    }
}

fn text_block(text: &str) -> Vec<ContentBlock> {
    if text.trim().is_empty() {
        Vec::new()
    } else {
        vec![ContentBlock::Text { text: text.to_string() }]
    }
}

/// Map a non-success HTTP status to the gateway error taxonomy
fn status_error(status: StatusCode, body: &str) -> AgentError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AgentError::ProviderUnavailable(format!("authentication failed (HTTP {status})"))
        }
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            AgentError::ProviderUnavailable(format!("HTTP {status}: {snippet}"))
        }
        s if s.is_server_error() => {
            AgentError::ProviderUnavailable(format!("HTTP {status}: {snippet}"))
        }
        _ => AgentError::Provider(format!("HTTP {status}: {snippet}")),
    }
}

fn transport_error(err: &reqwest::Error) -> AgentError {
    if err.is_timeout() {
        AgentError::ProviderUnavailable("request timed out".into())
    } else {
        AgentError::ProviderUnavailable(err.to_string())
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.endpoint("/v1/models"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await;

        match response {
            Ok(r) => Ok(r.status().is_success()),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        system_prompt: &str,
        history: &[Turn],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = Self::build_request(system_prompt, history, tools, options);

        tracing::debug!(
            model = %options.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Anthropic request"
        );

        let response = self
            .client
            .post(self.endpoint("/v1/messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Malformed response: {e}")))?;

        Self::convert_response(body)
    }
}
