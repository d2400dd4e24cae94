//! Server Configuration
//!
//! Read from the environment (after `.env` is loaded). Every getter goes
//! through a lookup closure so tests can supply their own variables.

use std::str::FromStr;
use std::time::Duration;

use agent_runtime::AnthropicConfig;
use anyhow::{Context, bail};

/// Which LLM backend drives the agent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    Ollama,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => bail!("unknown LLM_PROVIDER '{other}' (expected 'anthropic' or 'ollama')"),
        }
    }
}

/// Server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,

    pub provider: ProviderKind,

    /// Model override; each provider has its own default
    pub model: Option<String>,

    /// Model round-trips allowed per user message
    pub max_iterations: usize,

    /// Upper bound on one model call
    pub gateway_timeout: Duration,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,

    /// Present when `ANTHROPIC_API_KEY` is set; its client timeout matches
    /// `gateway_timeout`
    pub anthropic: Option<AnthropicConfig>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
            let port = get("PORT").unwrap_or_else(|| "8000".into());
            format!("{host}:{port}")
        });

        let provider = get("LLM_PROVIDER")
            .map(|p| p.parse::<ProviderKind>())
            .transpose()?
            .unwrap_or(ProviderKind::Anthropic);

        let max_iterations = parse(get("MAX_ITERATIONS"), "MAX_ITERATIONS")?.unwrap_or(10);
        if max_iterations == 0 {
            bail!("MAX_ITERATIONS must be at least 1");
        }

        let timeout_secs: u64 = parse(get("GATEWAY_TIMEOUT_SECS"), "GATEWAY_TIMEOUT_SECS")?.unwrap_or(120);
        if timeout_secs == 0 {
            bail!("GATEWAY_TIMEOUT_SECS must be at least 1");
        }
        let gateway_timeout = Duration::from_secs(timeout_secs);

        let anthropic = AnthropicConfig::from_lookup(&lookup).map(|c| c.with_timeout(gateway_timeout));

        Ok(Self {
            bind_addr,
            provider,
            model: get("MODEL"),
            max_iterations,
            gateway_timeout,
            temperature: parse(get("TEMPERATURE"), "TEMPERATURE")?,
            max_tokens: parse(get("ANTHROPIC_MAX_TOKENS"), "ANTHROPIC_MAX_TOKENS")?,
            anthropic,
        })
    }
}

fn parse<T>(value: Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|v| v.parse::<T>().with_context(|| format!("invalid {key} value '{v}'")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.provider, ProviderKind::Anthropic);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.gateway_timeout, Duration::from_secs(120));
        assert!(config.model.is_none());
        assert!(config.anthropic.is_none());
    }

    #[test]
    fn test_anthropic_client_timeout_matches_gateway_timeout() {
        let config = load(&[("ANTHROPIC_API_KEY", "sk-test"), ("GATEWAY_TIMEOUT_SECS", "300")]).unwrap();
        assert_eq!(config.gateway_timeout, Duration::from_secs(300));
        assert_eq!(config.anthropic.unwrap().timeout_secs, 300);

        let config = load(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.anthropic.unwrap().timeout_secs, 120);
    }

    #[test]
    fn test_host_and_port_compose_bind_addr() {
        let config = load(&[("HOST", "127.0.0.1"), ("PORT", "9001")]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9001");

        let config = load(&[("BIND_ADDR", "[::]:80"), ("PORT", "9001")]).unwrap();
        assert_eq!(config.bind_addr, "[::]:80");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("LLM_PROVIDER", "Ollama"),
            ("MODEL", "llama3.1"),
            ("MAX_ITERATIONS", "4"),
            ("TEMPERATURE", "0.2"),
        ])
        .unwrap();

        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.model.as_deref(), Some("llama3.1"));
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(load(&[("MAX_ITERATIONS", "ten")]).is_err());
        assert!(load(&[("MAX_ITERATIONS", "0")]).is_err());
        assert!(load(&[("LLM_PROVIDER", "gpt")]).is_err());
        assert!(load(&[("GATEWAY_TIMEOUT_SECS", "0")]).is_err());
    }
}
