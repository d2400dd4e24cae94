//! Cycling Trip Planner HTTP Server
//!
//! Axum-based server exposing the trip planner agent as a REST API.
//! Conversations live in memory for the lifetime of the process.

mod config;
mod error;
mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{Agent, AgentBuilder, LlmProvider, provider::DEFAULT_MODEL};
use agent_runtime::AnthropicProvider;

use crate::config::{ProviderKind, ServerConfig};
use crate::handlers::{
    chat_handler, clear_sessions, continue_handler, health_check, list_sessions, reset_handler, root,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    let agent = build_agent(&config).await?;
    let state = AppState::new(agent);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚲 Cycling trip planner running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET    /                       - Liveness");
    tracing::info!("  GET    /health                 - Health check");
    tracing::info!("  POST   /chat                   - Send message");
    tracing::info!("  POST   /chat/{{id}}/continue     - Continue a conversation");
    tracing::info!("  POST   /reset/{{id}}             - Reset a conversation");
    tracing::info!("  GET    /sessions               - List conversations");
    tracing::info!("  DELETE /sessions               - Clear all conversations");
    tracing::info!("");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// All routes with CORS and request tracing
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/", get(root))
        .route("/health", get(health_check))
        // Agent API
        .route("/chat", post(chat_handler))
        .route("/chat/{conversation_id}/continue", post(continue_handler))
        .route("/reset/{conversation_id}", post(reset_handler))
        // Debug
        .route("/sessions", get(list_sessions).delete(clear_sessions))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assemble the agent; `None` when the provider has no credentials
async fn build_agent(config: &ServerConfig) -> anyhow::Result<Option<Agent>> {
    let (provider, default_model): (Arc<dyn LlmProvider>, &str) = match config.provider {
        ProviderKind::Anthropic => match config.anthropic.clone() {
            Some(anthropic) => {
                let provider = AnthropicProvider::from_config(anthropic)?;
                (Arc::new(provider) as Arc<dyn LlmProvider>, DEFAULT_MODEL)
            }
            None => {
                tracing::warn!("⚠ ANTHROPIC_API_KEY not set - agent disabled");
                tracing::warn!("  Set it in .env or switch LLM_PROVIDER=ollama");
                return Ok(None);
            }
        },
        ProviderKind::Ollama => ollama_provider()?,
    };

    // Verify provider connection
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
        Ok(false) | Err(_) => tracing::warn!("⚠ {} not reachable - requests will fail until it is", provider.name()),
    }

    let tools = trip_planner::registry()?;
    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let mut builder = AgentBuilder::new()
        .provider(provider)
        .tools(Arc::new(tools))
        .system_prompt(trip_planner::TRIP_PLANNER_PROMPT)
        .model(config.model.clone().unwrap_or_else(|| default_model.to_string()))
        .max_iterations(config.max_iterations)
        .gateway_timeout(config.gateway_timeout);

    if let Some(temperature) = config.temperature {
        builder = builder.temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }

    Ok(Some(builder.build()?))
}

#[cfg(feature = "ollama")]
fn ollama_provider() -> anyhow::Result<(Arc<dyn LlmProvider>, &'static str)> {
    let provider = agent_runtime::OllamaProvider::from_env();
    tracing::info!(
        "Using Ollama at {}:{}",
        provider.config().host,
        provider.config().port
    );
    Ok((Arc::new(provider) as Arc<dyn LlmProvider>, agent_runtime::DEFAULT_OLLAMA_MODEL))
}

#[cfg(not(feature = "ollama"))]
fn ollama_provider() -> anyhow::Result<(Arc<dyn LlmProvider>, &'static str)> {
    anyhow::bail!("LLM_PROVIDER=ollama requires building with the `ollama` feature")
}
