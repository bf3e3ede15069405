// src/summarize.rs
//! Article summarization through a hosted LLM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Config, LlmConfig, LlmProvider};
use crate::ingest::types::Entry;

pub const SYSTEM_PROMPT: &str = "You are a concise news summarizer.";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const MAX_TOKENS: u32 = 100;
const TEMPERATURE: f32 = 0.7;
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, entry: &Entry) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub type DynSummarizer = Arc<dyn Summarizer>;

/// User turn sent for every article.
pub fn build_prompt(entry: &Entry) -> String {
    format!(
        "Summarize this article in 2-3 concise sentences:\nTitle: {}\nContent: {}",
        entry.title, entry.content
    )
}

/// Pick the provider named in the config.
pub fn build_summarizer(cfg: &Config) -> Result<DynSummarizer> {
    build_from_llm(&cfg.llm)
}

pub fn build_from_llm(llm: &LlmConfig) -> Result<DynSummarizer> {
    if llm.api_key.is_empty() {
        bail!("LLM_API_KEY is not set");
    }
    Ok(match llm.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiSummarizer::new(
            llm.api_key.clone(),
            llm.model.clone(),
        )?),
        LlmProvider::Anthropic => Arc::new(AnthropicSummarizer::new(
            llm.api_key.clone(),
            llm.model.clone(),
        )?),
    })
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("news-digest/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(30))
        .build()
        .context("building LLM http client")
}

async fn error_body(resp: reqwest::Response) -> String {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .unwrap_or_else(|_| String::from("unknown error"));
    format!("{status}: {text}")
}

// ------------------------------------------------------------
// OpenAI (Chat Completions)
// ------------------------------------------------------------

pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key,
            model: model.unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            url: OPENAI_URL.to_string(),
        })
    }

    /// Point at a different endpoint (proxies, tests).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: String,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, entry: &Entry) -> Result<String> {
        let prompt = build_prompt(entry);
        let req = ChatReq {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("sending request to OpenAI")?;
        if !resp.status().is_success() {
            bail!("OpenAI API error {}", error_body(resp).await);
        }
        let body: ChatResp = resp.json().await.context("parsing OpenAI response")?;
        let text = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("OpenAI returned no summary"))?;
        debug!(url = %entry.url, chars = text.len(), "summarized");
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Anthropic (Messages)
// ------------------------------------------------------------

pub struct AnthropicSummarizer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl AnthropicSummarizer {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            api_key,
            model: model.unwrap_or_else(|| ANTHROPIC_DEFAULT_MODEL.to_string()),
            url: ANTHROPIC_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[derive(Serialize)]
struct MessagesReq<'a> {
    model: &'a str,
    system: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct MessagesResp {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Summarizer for AnthropicSummarizer {
    async fn summarize(&self, entry: &Entry) -> Result<String> {
        let prompt = build_prompt(entry);
        let req = MessagesReq {
            model: &self.model,
            system: SYSTEM_PROMPT,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Msg {
                role: "user",
                content: &prompt,
            }],
        };

        let resp = self
            .http
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await
            .context("sending request to Anthropic")?;
        if !resp.status().is_success() {
            bail!("Anthropic API error {}", error_body(resp).await);
        }
        let body: MessagesResp = resp.json().await.context("parsing Anthropic response")?;
        let text = body
            .content
            .first()
            .map(|c| c.text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Anthropic returned no summary"))?;
        debug!(url = %entry.url, chars = text.len(), "summarized");
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}
