use crate::config::TelegramSettings;
use crate::error::{AppError, Result};
use crate::observability::{get_metrics, LatencyTimer};
use crate::telegram::types::{ApiReply, SendMessage};
use anyhow::anyhow;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Outbound side of the chat transport.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub token: String,
    pub retry_count: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.telegram.org".to_string(),
            token: String::new(),
            retry_count: 3,
            retry_delay_ms: 200,
            request_timeout_ms: 10_000,
        }
    }
}

impl From<&TelegramSettings> for ClientConfig {
    fn from(settings: &TelegramSettings) -> Self {
        Self {
            api_base_url: settings.api_base_url.clone(),
            token: settings.token.clone(),
            ..Self::default()
        }
    }
}

/// Bot API client over reqwest.
pub struct TelegramClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `{api_base_url}/bot{token}/{method}`
    pub fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    async fn post_once(&self, body: &SendMessage<'_>) -> Result<()> {
        let reply: ApiReply = self
            .http
            .post(self.method_url("sendMessage"))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if reply.ok {
            Ok(())
        } else {
            Err(AppError::Internal(anyhow!(
                "Telegram rejected sendMessage: {}",
                reply.description.unwrap_or_default()
            )))
        }
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let body = SendMessage { chat_id, text };
        let timer = LatencyTimer::new();
        let mut attempt = 0;

        loop {
            match self.post_once(&body).await {
                Ok(()) => {
                    get_metrics().record_reply_sent(true, timer.elapsed_ms());
                    debug!(chat_id, attempt, "Reply sent");
                    return Ok(());
                }
                Err(e) if attempt < self.config.retry_count => {
                    attempt += 1;
                    warn!(chat_id, attempt, error = %e, "sendMessage failed, retrying");
                    tokio::time::sleep(Duration::from_millis(
                        self.config.retry_delay_ms * attempt as u64,
                    ))
                    .await;
                }
                Err(e) => {
                    get_metrics().record_reply_sent(false, timer.elapsed_ms());
                    return Err(e);
                }
            }
        }
    }
}
