//! # agent-core
//!
//! Core agent logic with provider-agnostic LLM abstraction, a validated tool
//! registry and a per-conversation locked session store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │    Tools    │  │   LlmProvider       │  │
//! │  │    Loop     │──│   Registry  │──│   (Strategy)        │  │
//! │  └──────┬──────┘  └─────────────┘  └─────────────────────┘  │
//! │         │                                                    │
//! │  ┌──────▼──────────────────────┐                             │
//! │  │  SessionStore (per-id lock) │                             │
//! │  └─────────────────────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Anthropic, Ollama or a
//! scripted test double without changing agent logic.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Role, Turn, TurnContent};
pub use provider::{Completion, GenerationOptions, LlmProvider, ModelResponse, ScriptedProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentReply, FALLBACK_REPLY};
pub use session::{MemorySessionStore, Session, SessionHandle, SessionId, SessionState, SessionStore};
pub use tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
