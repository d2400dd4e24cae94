//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference. Ollama models
//! get no native tool channel here: tools are described in the system prompt
//! and calls come back as fenced `tool` JSON blocks in the reply text.

use agent_core::{
    error::{AgentError, Result},
    message::{Turn, TurnContent},
    provider::{Completion, GenerationOptions, LlmProvider, ModelResponse},
    tool::{ToolCall, ToolSchema, render_prompt_section},
};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, MessageRole, request::ChatMessageRequest},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

/// Model used when `MODEL` is not set and the provider is Ollama
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

const TOOL_FENCE: &str = "```tool";

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("OLLAMA_HOST").unwrap_or(defaults.host),
            port: lookup("OLLAMA_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }
}

/// A tool call as written by the model
#[derive(Deserialize)]
struct TextToolCall {
    tool: String,
    #[serde(default)]
    arguments: Value,
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Convert turns to Ollama chat messages, rendering tool traffic as text
    fn convert_history(system_prompt: &str, history: &[Turn], tools: &[ToolSchema]) -> Vec<ChatMessage> {
        let mut system = system_prompt.to_string();
        if !tools.is_empty() {
            system.push_str("\n\n");
            system.push_str(&render_prompt_section(tools));
        }

        let mut messages = vec![ChatMessage::new(MessageRole::System, system)];

        for turn in history {
            let (role, content) = match &turn.content {
                TurnContent::UserText { text } => (MessageRole::User, text.clone()),
                TurnContent::AssistantText { text } => (MessageRole::Assistant, text.clone()),
                TurnContent::ToolRequest { text, calls } => {
                    let mut content = text.clone().unwrap_or_default();
                    for call in calls {
                        let block = serde_json::json!({"tool": call.name, "arguments": call.arguments});
                        content.push_str(&format!("\n{TOOL_FENCE}\n{block}\n```"));
                    }
                    (MessageRole::Assistant, content.trim_start().to_string())
                }
                // Tool output reaches the model as user context
                TurnContent::ToolResult { result } => {
                    let verdict = if result.success { "returned" } else { "failed" };
                    (
                        MessageRole::User,
                        format!("[Tool '{}' {}]\n{}", result.name, verdict, result.output),
                    )
                }
            };
            messages.push(ChatMessage::new(role, content));
        }

        messages
    }

    /// Split a reply into its prose and any tool calls it contains
    fn parse_reply(content: &str) -> ModelResponse {
        let mut calls = Vec::new();
        let mut prose = String::new();
        let mut rest = content;

        while let Some(start) = rest.find(TOOL_FENCE) {
            prose.push_str(&rest[..start]);
            let body_start = start + TOOL_FENCE.len();
            let Some(len) = rest[body_start..].find("```") else {
                prose.push_str(&rest[start..]);
                rest = "";
                break;
            };

            let body = rest[body_start..body_start + len].trim();
            match serde_json::from_str::<TextToolCall>(body) {
                Ok(call) => calls.push(into_call(call)),
                Err(e) => tracing::warn!("Ignoring malformed tool block: {}", e),
            }
            rest = &rest[body_start + len + 3..];
        }
        prose.push_str(rest);

        // Some models drop the fence and reply with the bare JSON object
        if calls.is_empty() {
            let trimmed = content.trim();
            if trimmed.starts_with('{') {
                if let Ok(call) = serde_json::from_str::<TextToolCall>(trimmed) {
                    return ModelResponse::tool_requests(vec![into_call(call)]);
                }
            }
            return ModelResponse::Final(content.trim().to_string());
        }

        let prose = prose.trim();
        ModelResponse::ToolRequests {
            calls,
            text: (!prose.is_empty()).then(|| prose.to_string()),
        }
    }
}

fn into_call(call: TextToolCall) -> ToolCall {
    let arguments = match call.arguments {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    ToolCall::new(format!("call_{}", Uuid::new_v4().simple()), call.tool, arguments)
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.list_local_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
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
        let messages = Self::convert_history(system_prompt, history, tools);
        let request = ChatMessageRequest::new(options.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        Ok(Completion::new(
            Self::parse_reply(&response.message.content),
            options.model.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::{ParameterSchema, ToolResult};
    use serde_json::json;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::from_lookup(|_| None);
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);

        let config = OllamaConfig::from_lookup(|key| match key {
            "OLLAMA_PORT" => Some("not-a-port".into()),
            _ => None,
        });
        assert_eq!(config.port, 11434);
    }

    #[test]
    fn test_plain_reply_is_final() {
        let response = OllamaProvider::parse_reply("  Bruges is lovely in June.  ");
        assert_eq!(response, ModelResponse::Final("Bruges is lovely in June.".into()));
    }

    #[test]
    fn test_fenced_blocks_become_calls() {
        let reply = "Let me check two things.\n```tool\n{\"tool\": \"get_route\", \"arguments\": {\"origin\": \"Amsterdam\", \"destination\": \"Bruges\"}}\n```\n```tool\n{\"tool\": \"get_weather\", \"arguments\": {\"location\": \"Bruges\", \"month\": \"June\"}}\n```";

        let ModelResponse::ToolRequests { calls, text } = OllamaProvider::parse_reply(reply) else {
            panic!("expected tool requests");
        };
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "get_route");
        assert_eq!(calls[1].optional_str("month"), Some("June"));
        assert_ne!(calls[0].id, calls[1].id);
        assert_eq!(text.as_deref(), Some("Let me check two things."));
    }

    #[test]
    fn test_bare_json_call_and_malformed_block() {
        let response = OllamaProvider::parse_reply(r#"{"tool": "get_points_of_interest", "arguments": {"location": "Ghent"}}"#);
        let ModelResponse::ToolRequests { calls, .. } = response else {
            panic!("expected tool requests");
        };
        assert_eq!(calls[0].name, "get_points_of_interest");

        let response = OllamaProvider::parse_reply("```tool\nnot json\n```\nSorry about that.");
        assert!(response.is_final());
    }

    #[test]
    fn test_history_renders_tool_traffic() {
        let schema = ToolSchema {
            name: "get_weather".into(),
            description: "Monthly climate".into(),
            parameters: vec![ParameterSchema::required("location", "string", "City")],
            category: None,
        };
        let call = ToolCall::new("c1", "get_weather", json!({"location": "Bremen"}));
        let history = vec![
            Turn::user("Weather?"),
            Turn::tool_request(vec![call], None),
            Turn::tool_result(ToolResult::failure("c1", "get_weather", "Error: month missing")),
        ];

        let messages = OllamaProvider::convert_history("Plan rides.", &history, &[schema]);
        assert_eq!(messages.len(), 4);
        assert!(messages[0].content.contains("### get_weather"));
        assert!(messages[2].content.starts_with(TOOL_FENCE));
        assert!(messages[3].content.starts_with("[Tool 'get_weather' failed]"));
    }
}
