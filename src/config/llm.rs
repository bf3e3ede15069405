// src/config/llm.rs
use std::env;

/// Which hosted model summarizes articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            other => anyhow::bail!("Unsupported LLM provider: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    /// Overrides the provider's default model.
    pub model: Option<String>,
}

impl LlmConfig {
    /// LLM_PROVIDER (default openai), LLM_API_KEY, LLM_MODEL.
    pub fn from_env() -> anyhow::Result<Self> {
        let provider = env::var("LLM_PROVIDER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "openai".to_string())
            .parse()?;
        let api_key = env::var("LLM_API_KEY").unwrap_or_default().trim().to_string();
        let model = env::var("LLM_MODEL")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        Ok(Self {
            provider,
            api_key,
            model,
        })
    }
}
