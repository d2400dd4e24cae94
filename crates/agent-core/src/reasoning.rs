//! Reasoning Loop
//!
//! Drives one user message to a reply:
//!
//! ```text
//!   AwaitingModel ──Final──────────▶ Responding ──▶ Terminal
//!        ▲    │
//!        │    └──ToolRequests──▶ Invoking
//!        └──────results appended─────┘
//! ```
//!
//! The agent keeps nothing between calls; all continuity lives in the
//! [`Session`] passed in.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::Turn;
use crate::provider::{Completion, GenerationOptions, LlmProvider, ModelResponse};
use crate::session::Session;
use crate::tool::{ToolCall, ToolRegistry, ToolResult, ToolSchema};

/// Reply used when the model does not settle within the iteration budget
pub const FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble completing this request. Please try rephrasing.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt sent with every request
    pub system_prompt: String,

    /// Maximum model round-trips per user message
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Upper bound on a single provider call
    pub gateway_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 10,
            generation: GenerationOptions::default(),
            gateway_timeout: Duration::from_secs(120),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. \
Use the available tools when they help answer the user, then synthesize the results into a concise, accurate reply.";

/// Outcome of one exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentReply {
    /// Text shown to the user
    pub text: String,

    /// Tools that ran successfully, in call order
    pub tools_used: Vec<String>,

    /// Model round-trips spent
    pub rounds: usize,

    /// False when the iteration guard cut the exchange short
    pub completed: bool,
}

enum LoopState {
    AwaitingModel,
    Invoking {
        calls: Vec<ToolCall>,
        text: Option<String>,
    },
    Responding(String),
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Process one user message against a session
    ///
    /// Provider failures abort the exchange; turns appended before the failure
    /// stay in the history.
    pub async fn run(&self, session: &mut Session, user_message: &str) -> Result<AgentReply> {
        session.conversation.push(Turn::user(user_message));
        session.touch();

        let schemas = self.tools.schemas();
        let mut rounds = 0;
        let mut tools_used = Vec::new();
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if rounds >= self.config.max_iterations {
                        tracing::warn!(
                            session = %session.id,
                            max_iterations = self.config.max_iterations,
                            "Model did not converge, returning fallback reply"
                        );
                        session.conversation.push(Turn::assistant(FALLBACK_REPLY));
                        session.touch();
                        return Ok(AgentReply {
                            text: FALLBACK_REPLY.into(),
                            tools_used,
                            rounds,
                            completed: false,
                        });
                    }

                    rounds += 1;
                    let completion = self.request_completion(session, &schemas).await?;
                    tracing::debug!(
                        session = %session.id,
                        round = rounds,
                        model = %completion.model,
                        final_reply = completion.response.is_final(),
                        "Model responded"
                    );

                    match completion.response {
                        ModelResponse::Final(text) => LoopState::Responding(text),
                        ModelResponse::ToolRequests { calls, text } if calls.is_empty() => {
                            LoopState::Responding(text.unwrap_or_default())
                        }
                        ModelResponse::ToolRequests { calls, text } => LoopState::Invoking { calls, text },
                    }
                }

                LoopState::Invoking { calls, text } => {
                    let calls = ensure_unique_ids(calls);
                    let results = self.execute_round(&calls).await;

                    session.conversation.push(Turn::tool_request(calls, text));
                    for result in results {
                        if result.success {
                            tools_used.push(result.name.clone());
                            if let Some(data) = &result.data {
                                session.state.record_tool_output(&result.name, data.clone());
                            }
                        }
                        session.conversation.push(Turn::tool_result(result));
                    }
                    session.touch();

                    LoopState::AwaitingModel
                }

                LoopState::Responding(text) => {
                    session.conversation.push(Turn::assistant(&text));
                    session.touch();
                    tracing::info!(
                        session = %session.id,
                        rounds,
                        tools = tools_used.len(),
                        "Exchange complete"
                    );
                    return Ok(AgentReply {
                        text,
                        tools_used,
                        rounds,
                        completed: true,
                    });
                }
            };
        }
    }

    /// One provider call, bounded by the configured timeout
    async fn request_completion(&self, session: &Session, schemas: &[ToolSchema]) -> Result<Completion> {
        let call = self.provider.complete(
            &self.config.system_prompt,
            session.conversation.turns(),
            schemas,
            &self.config.generation,
        );

        tokio::time::timeout(self.config.gateway_timeout, call)
            .await
            .map_err(|_| {
                AgentError::ProviderUnavailable(format!(
                    "{} did not respond within {}s",
                    self.provider.name(),
                    self.config.gateway_timeout.as_secs()
                ))
            })?
    }

    /// Run every call of a round concurrently; results come back in call order
    async fn execute_round(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let finished = join_all(calls.iter().map(|call| self.execute_tool(call))).await;

        let mut by_id: HashMap<String, ToolResult> =
            finished.into_iter().map(|r| (r.id.clone(), r)).collect();

        calls
            .iter()
            .map(|call| {
                by_id
                    .remove(&call.id)
                    .unwrap_or_else(|| call.failure("Tool produced no result"))
            })
            .collect()
    }

    /// Execute a tool call, folding every error into a failure result
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        tracing::debug!(tool = %call.name, id = %call.id, "Executing tool");

        match self.tools.execute(call).await {
            Ok(mut result) => {
                result.id.clone_from(&call.id);
                result.name.clone_from(&call.name);
                result
            }
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                call.failure(format!("Error: {e}"))
            }
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Give blank or repeated correlation ids a fresh one so results can be matched by id
fn ensure_unique_ids(mut calls: Vec<ToolCall>) -> Vec<ToolCall> {
    let mut seen = HashSet::new();
    for call in &mut calls {
        if call.id.trim().is_empty() || !seen.insert(call.id.clone()) {
            call.id = format!("call_{}", uuid::Uuid::new_v4().simple());
            seen.insert(call.id.clone());
        }
    }
    calls
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: Arc::new(ToolRegistry::new()),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn gateway_timeout(mut self, timeout: Duration) -> Self {
        self.config.gateway_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_iterations == 0 {
            return Err(AgentError::Config("max_iterations must be at least 1".into()));
        }

        Ok(Agent::new(provider, self.tools, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Role, TurnContent};
    use crate::provider::ScriptedProvider;
    use crate::session::{MemorySessionStore, SessionId, SessionStore};
    use crate::tool::{ParameterSchema, Tool};
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeRouteTool;

    #[async_trait]
    impl Tool for FakeRouteTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "get_route".into(),
                description: "Route between two places".into(),
                parameters: vec![
                    ParameterSchema::required("origin", "string", "Start"),
                    ParameterSchema::required("destination", "string", "End"),
                    ParameterSchema::optional("days", "integer", "Trip length"),
                ],
                category: None,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let origin = call.str_arg("origin")?;
            let destination = call.str_arg("destination")?;
            let days = call.optional_u64("days").unwrap_or(1);
            Ok(call.success(json!({
                "origin": origin,
                "destination": destination,
                "distance_km": 240,
                "estimated_days": days,
            })))
        }
    }

    fn route_call(id: &str) -> ToolCall {
        ToolCall::new(
            id,
            "get_route",
            json!({"origin": "City A", "destination": "City B", "days": 3}),
        )
    }

    fn agent_with(provider: Arc<ScriptedProvider>, max_iterations: usize) -> Agent {
        let mut registry = ToolRegistry::new();
        registry.register(FakeRouteTool).unwrap();

        AgentBuilder::new()
            .provider(provider)
            .tools(Arc::new(registry))
            .max_iterations(max_iterations)
            .gateway_timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn session() -> Session {
        Session::with_id(SessionId::from_string("test"))
    }

    fn kinds(session: &Session) -> Vec<&'static str> {
        session
            .conversation
            .turns()
            .iter()
            .map(|t| match t.content {
                TurnContent::UserText { .. } => "user",
                TurnContent::AssistantText { .. } => "assistant",
                TurnContent::ToolRequest { .. } => "tool_request",
                TurnContent::ToolResult { .. } => "tool_result",
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_tool_round_then_final() {
        let provider = Arc::new(ScriptedProvider::new([
            ModelResponse::tool_requests(vec![route_call("toolu_1")]),
            ModelResponse::Final("Day 1: City A to the river...".into()),
        ]));
        let agent = agent_with(provider.clone(), 10);
        let mut session = session();

        let reply = agent
            .run(&mut session, "Plan a 3-day route from City A to City B")
            .await
            .unwrap();

        assert_eq!(reply.text, "Day 1: City A to the river...");
        assert_eq!(reply.tools_used, vec!["get_route"]);
        assert_eq!(reply.rounds, 2);
        assert!(reply.completed);
        assert_eq!(kinds(&session), vec!["user", "tool_request", "tool_result", "assistant"]);

        let TurnContent::ToolResult { result } = &session.conversation.turns()[2].content else {
            panic!("expected tool result");
        };
        assert!(result.success);
        assert_eq!(result.id, "toolu_1");
        assert_eq!(result.data.as_ref().unwrap()["estimated_days"], json!(3));
        assert_eq!(session.state.trip_draft["get_route"]["distance_km"], json!(240));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_failure_result() {
        let provider = Arc::new(ScriptedProvider::new([
            ModelResponse::tool_requests(vec![ToolCall::new("toolu_x", "nonexistent_tool", json!({}))]),
            ModelResponse::Final("Sorry, I could not look that up.".into()),
        ]));
        let agent = agent_with(provider, 10);
        let mut session = session();

        let reply = agent.run(&mut session, "Do something odd").await.unwrap();

        assert!(reply.completed);
        assert!(reply.tools_used.is_empty());
        let TurnContent::ToolResult { result } = &session.conversation.turns()[2].content else {
            panic!("expected tool result");
        };
        assert!(!result.success);
        assert!(result.output.contains("Unknown tool: nonexistent_tool"));
        assert!(session.state.trip_draft.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_fed_back() {
        let provider = Arc::new(ScriptedProvider::new([
            ModelResponse::tool_requests(vec![ToolCall::new("t1", "get_route", json!({"origin": "A"}))]),
            ModelResponse::tool_requests(vec![route_call("t2")]),
            ModelResponse::Final("Fixed it.".into()),
        ]));
        let agent = agent_with(provider, 10);
        let mut session = session();

        let reply = agent.run(&mut session, "Route please").await.unwrap();

        assert_eq!(reply.rounds, 3);
        assert_eq!(reply.tools_used, vec!["get_route"]);
        let TurnContent::ToolResult { result } = &session.conversation.turns()[2].content else {
            panic!("expected tool result");
        };
        assert!(result.output.contains("'destination'"));
    }

    #[tokio::test]
    async fn test_iteration_guard_returns_fallback() {
        let provider = Arc::new(ScriptedProvider::repeating(ModelResponse::tool_requests(vec![
            route_call("again"),
        ])));
        let agent = agent_with(provider.clone(), 3);
        let mut session = session();

        let reply = agent.run(&mut session, "Loop forever").await.unwrap();

        assert_eq!(reply.text, FALLBACK_REPLY);
        assert!(!reply.completed);
        assert_eq!(reply.rounds, 3);
        assert_eq!(provider.calls(), 3);
        assert_eq!(session.conversation.last().unwrap().text(), Some(FALLBACK_REPLY));
        assert!(session.conversation.unanswered_calls().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_appended_turns() {
        let provider = Arc::new(ScriptedProvider::from_results([
            Ok(ModelResponse::tool_requests(vec![route_call("t1")])),
            Err(AgentError::ProviderUnavailable("connection refused".into())),
        ]));
        let agent = agent_with(provider, 10);
        let mut session = session();

        let err = agent.run(&mut session, "Plan it").await.unwrap_err();

        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
        assert_eq!(kinds(&session), vec!["user", "tool_request", "tool_result"]);
    }

    #[tokio::test]
    async fn test_provider_timeout_is_unavailable() {
        let provider = Arc::new(
            ScriptedProvider::new([ModelResponse::Final("late".into())])
                .with_delay(Duration::from_millis(500)),
        );
        let agent = AgentBuilder::new()
            .provider(provider)
            .gateway_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let mut session = session();

        let err = agent.run(&mut session, "Hello?").await.unwrap_err();

        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
        assert_eq!(kinds(&session), vec!["user"]);
    }

    #[tokio::test]
    async fn test_provisional_text_is_not_the_reply() {
        let provider = Arc::new(ScriptedProvider::new([
            ModelResponse::ToolRequests {
                calls: vec![route_call("t1")],
                text: Some("Let me check the route.".into()),
            },
            ModelResponse::Final("Here is your plan.".into()),
        ]));
        let agent = agent_with(provider, 10);
        let mut session = session();

        let reply = agent.run(&mut session, "Plan it").await.unwrap();

        assert_eq!(reply.text, "Here is your plan.");
        let TurnContent::ToolRequest { text, .. } = &session.conversation.turns()[1].content else {
            panic!("expected tool request");
        };
        assert_eq!(text.as_deref(), Some("Let me check the route."));
    }

    #[tokio::test]
    async fn test_results_reattached_by_correlation_id() {
        let provider = Arc::new(ScriptedProvider::new([
            ModelResponse::tool_requests(vec![
                route_call("first"),
                ToolCall::new("second", "nonexistent_tool", json!({})),
                route_call("first"),
            ]),
            ModelResponse::Final("ok".into()),
        ]));
        let agent = agent_with(provider, 10);
        let mut session = session();

        agent.run(&mut session, "Three calls").await.unwrap();

        let turns = session.conversation.turns();
        let requested = turns[1].correlation_ids();
        let answered: Vec<&str> = turns[2..5].iter().flat_map(Turn::correlation_ids).collect();

        assert_eq!(requested.len(), 3);
        assert_eq!(requested[..2], ["first", "second"]);
        assert_ne!(requested[2], "first");
        assert_eq!(requested, answered);
        assert!(session.conversation.unanswered_calls().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_append_only_across_exchanges() {
        let provider = Arc::new(ScriptedProvider::new([
            ModelResponse::tool_requests(vec![route_call("t1")]),
            ModelResponse::Final("first".into()),
            ModelResponse::Final("second".into()),
        ]));
        let agent = agent_with(provider, 10);
        let mut session = session();

        agent.run(&mut session, "one").await.unwrap();
        let before = serde_json::to_value(session.conversation.turns()).unwrap();

        agent.run(&mut session, "two").await.unwrap();
        let after = serde_json::to_value(session.conversation.turns()).unwrap();

        let before = before.as_array().unwrap();
        let after = after.as_array().unwrap();
        assert_eq!(after.len(), before.len() + 2);
        assert_eq!(&after[..before.len()], &before[..]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_conversation_requests_never_interleave() {
        let provider = Arc::new(
            ScriptedProvider::new([
                ModelResponse::tool_requests(vec![route_call("round-1")]),
                ModelResponse::Final("reply one".into()),
                ModelResponse::tool_requests(vec![route_call("round-2")]),
                ModelResponse::Final("reply two".into()),
            ])
            .with_delay(Duration::from_millis(10)),
        );
        let agent = Arc::new(agent_with(provider, 10));
        let store = Arc::new(MemorySessionStore::new());
        let id = SessionId::from_string("shared");

        let tasks: Vec<_> = ["message a", "message b"]
            .into_iter()
            .map(|message| {
                let agent = agent.clone();
                let store = store.clone();
                let id = id.clone();
                tokio::spawn(async move {
                    let handle = store.get_or_create(&id, None)?;
                    let mut session = handle.lock().await;
                    agent.run(&mut session, message).await
                })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().unwrap().completed);
        }

        let handle = store.get_or_create(&id, None).unwrap();
        let session = handle.lock().await;
        let roles: Vec<Role> = session.conversation.turns().iter().map(Turn::role).collect();
        assert_eq!(session.conversation.len(), 8);
        assert_eq!(
            kinds(&session),
            vec![
                "user", "tool_request", "tool_result", "assistant",
                "user", "tool_request", "tool_result", "assistant",
            ]
        );
        assert_eq!(roles[3], Role::Assistant);

        let turns = session.conversation.turns();
        assert_eq!(turns[1].correlation_ids(), turns[2].correlation_ids());
        assert_eq!(turns[5].correlation_ids(), turns[6].correlation_ids());
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
