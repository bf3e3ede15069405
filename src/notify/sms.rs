// src/notify/sms.rs
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::{format_messages, Notifier};
use crate::config::TwilioConfig;
use crate::ingest::types::Entry;

const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";

/// Sends digest chunks as SMS through the Twilio REST API.
#[derive(Clone)]
pub struct SmsNotifier {
    cfg: TwilioConfig,
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl SmsNotifier {
    pub fn new(cfg: TwilioConfig) -> Self {
        Self {
            cfg,
            client: Client::new(),
            base_url: TWILIO_API.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the API root (tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.cfg.account_sid
        )
    }

    async fn send_one(&self, body: &str) -> Result<()> {
        let form = [
            ("From", self.cfg.from_phone.as_str()),
            ("To", self.cfg.to_phone.as_str()),
            ("Body", body),
        ];
        let rsp = self
            .client
            .post(self.messages_url())
            .timeout(self.timeout)
            .basic_auth(&self.cfg.account_sid, Some(&self.cfg.auth_token))
            .form(&form)
            .send()
            .await
            .context("twilio request")?;

        let status = rsp.status();
        if !status.is_success() {
            let text = rsp.text().await.unwrap_or_default();
            return Err(anyhow!("Failed to send SMS: Twilio {status}: {text}"));
        }
        debug!(target: "notify", chars = body.chars().count(), "sms sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    async fn send(&self, entries: &[Entry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let messages = format_messages(entries);
        for msg in &messages {
            self.send_one(msg).await?;
        }
        info!(target: "notify", messages = messages.len(), entries = entries.len(), "digest delivered");
        Ok(())
    }
}
