//! # agent-runtime
//!
//! LLM providers for the trip planner agent.
//!
//! ## Providers
//!
//! - **Anthropic**: Messages API with native tool use
//! - **Ollama** (feature `ollama`, default): local inference, tools via prompt
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{AnthropicConfig, AnthropicProvider};
//!
//! let config = AnthropicConfig::new(api_key).with_timeout(Duration::from_secs(120));
//! let provider = AnthropicProvider::from_config(config)?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .tools(Arc::new(registry))
//!     .build()?;
//! ```

pub mod anthropic;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use anthropic::{AnthropicConfig, AnthropicProvider};

#[cfg(feature = "ollama")]
pub use ollama::{DEFAULT_OLLAMA_MODEL, OllamaConfig, OllamaProvider};
