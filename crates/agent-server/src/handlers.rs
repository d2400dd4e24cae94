//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use agent_core::{Agent, SessionHandle, SessionId, SessionState};

use crate::error::ApiError;
use crate::state::AppState;

/// Longest conversation id accepted from clients
pub const MAX_CONVERSATION_ID_LEN: usize = 128;

const SERVICE_NAME: &str = "cycling-trip-planner";

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub agent_initialized: bool,
    pub provider: Option<String>,
    pub provider_connected: bool,
    pub active_sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub session_state: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub reply: String,
    pub tools_used: Vec<String>,
    pub session_state: SessionState,
    pub next_request: NextRequest,
}

/// Body for the follow-up message, with `message` left for the client to fill
#[derive(Debug, Serialize)]
pub struct NextRequest {
    pub message: String,
    pub conversation_id: String,
    pub session_state: SessionState,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub active_sessions: usize,
    pub session_ids: Vec<SessionId>,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub status: &'static str,
    pub message: String,
    pub cleared: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = match &state.agent {
        Some(agent) => agent.provider().health_check().await.unwrap_or(false),
        None => false,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        agent_initialized: state.agent.is_some(),
        provider: state.provider_name().map(String::from),
        provider_connected,
        active_sessions: state.sessions.len().unwrap_or(0),
    })
}

/// Start or continue a conversation
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = validate_message(&payload.message)?;
    let id = match payload.conversation_id.as_deref() {
        Some(id) => validate_conversation_id(id)?,
        None => SessionId::new(),
    };
    let agent = state.agent.as_ref().ok_or(ApiError::AgentUnavailable)?;

    let handle = state
        .sessions
        .get_or_create(&id, payload.session_state.map(seed_preferences))?;

    run_exchange(agent, handle, message).await.map(Json)
}

/// Continue a conversation that must already exist
pub async fn continue_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let id = validate_conversation_id(&conversation_id)?;
    let message = validate_message(&payload.message)?;
    let agent = state.agent.as_ref().ok_or(ApiError::AgentUnavailable)?;

    let handle = state
        .sessions
        .get(&id)?
        .ok_or(ApiError::ConversationNotFound(conversation_id))?;

    run_exchange(agent, handle, message).await.map(Json)
}

/// Wipe one conversation's history; unknown ids succeed too
pub async fn reset_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = validate_conversation_id(&conversation_id)?;
    state.sessions.reset(&id).await?;

    Ok(Json(StatusResponse {
        status: "success",
        message: format!("Conversation {id} has been reset"),
    }))
}

/// Debug: list conversations
pub async fn list_sessions(State(state): State<AppState>) -> Result<Json<SessionsResponse>, ApiError> {
    let session_ids = state.sessions.list_ids()?;
    Ok(Json(SessionsResponse {
        active_sessions: session_ids.len(),
        session_ids,
    }))
}

/// Debug: drop every conversation
pub async fn clear_sessions(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let cleared = state.sessions.clear_all()?;
    Ok(Json(ClearResponse {
        status: "success",
        message: format!("Cleared {cleared} sessions"),
        cleared,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Hold the conversation lock for the whole exchange
async fn run_exchange(agent: &Agent, handle: SessionHandle, message: &str) -> Result<ChatResponse, ApiError> {
    let mut session = handle.lock().await;
    let reply = agent.run(&mut session, message).await?;

    tracing::info!(
        session = %session.id,
        rounds = reply.rounds,
        tools = ?reply.tools_used,
        completed = reply.completed,
        "Exchange finished"
    );

    let conversation_id = session.id.to_string();
    Ok(ChatResponse {
        next_request: NextRequest {
            message: String::new(),
            conversation_id: conversation_id.clone(),
            session_state: session.state.clone(),
        },
        conversation_id,
        reply: reply.text,
        tools_used: reply.tools_used,
        session_state: session.state.clone(),
    })
}

fn validate_message(message: &str) -> Result<&str, ApiError> {
    if message.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Message must not be empty".into()));
    }
    Ok(message)
}

fn validate_conversation_id(id: &str) -> Result<SessionId, ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Conversation id must not be empty".into()));
    }
    if id.chars().count() > MAX_CONVERSATION_ID_LEN {
        return Err(ApiError::InvalidRequest(format!(
            "Conversation id must be at most {MAX_CONVERSATION_ID_LEN} characters"
        )));
    }
    Ok(SessionId::from_string(id))
}

/// Clients may echo back a whole `session_state`; only its preferences seed a new session
fn seed_preferences(mut state: Map<String, Value>) -> Map<String, Value> {
    match state.remove("preferences") {
        Some(Value::Object(preferences)) => preferences,
        Some(other) => {
            state.insert("preferences".into(), other);
            state
        }
        None => state,
    }
}
