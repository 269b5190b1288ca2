use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use engine_logging::{engine_debug, engine_info, engine_warn};
use watcher_core::{chunk_message, DEFAULT_MAX_MESSAGE_UNITS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("rejected with status {status}: {description}")]
    Rejected { status: u16, description: String },
    #[error("api error: {0}")]
    Api(String),
}

/// An outbound push channel taking one text body per call.
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

/// Local-log-only mode, used when no push credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait::async_trait]
impl NotificationChannel for LogChannel {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        engine_info!("Notification (log only):\n{}", text);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub api_base: String,
    pub token: String,
    pub chat_id: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Telegram Bot API `sendMessage`.
pub struct TelegramChannel {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(settings: TelegramSettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            settings.api_base.trim_end_matches('/'),
            settings.token
        );
        Ok(Self {
            client,
            endpoint,
            chat_id: settings.chat_id,
        })
    }
}

#[async_trait::async_trait]
impl NotificationChannel for TelegramChannel {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            disable_web_page_preview: true,
        };
        // The endpoint embeds the bot token, so errors are stripped of URLs.
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| NotifyError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let parsed = response.json::<ApiResponse>().await.ok();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: parsed
                    .and_then(|r| r.description)
                    .unwrap_or_else(|| status.to_string()),
            });
        }
        match parsed {
            Some(ApiResponse { ok: true, .. }) => Ok(()),
            Some(ApiResponse { description, .. }) => Err(NotifyError::Api(
                description.unwrap_or_else(|| "ok=false".to_string()),
            )),
            None => Err(NotifyError::Api("unreadable response body".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifierSettings {
    /// Minimum gap between two consecutive deliveries.
    pub min_spacing: Duration,
    /// Per-message ceiling in UTF-16 code units.
    pub max_units: usize,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            min_spacing: Duration::from_millis(1100),
            max_units: DEFAULT_MAX_MESSAGE_UNITS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chunks: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.delivered == self.chunks
    }
}

/// Chunks, spaces out and delivers messages. Failures are logged and
/// swallowed; a send never fails the caller.
pub struct Notifier {
    channel: Box<dyn NotificationChannel>,
    settings: NotifierSettings,
    last_sent: Option<Instant>,
}

impl Notifier {
    pub fn new(channel: Box<dyn NotificationChannel>, settings: NotifierSettings) -> Self {
        Self {
            channel,
            settings,
            last_sent: None,
        }
    }

    pub fn channel_name(&self) -> &'static str {
        self.channel.name()
    }

    pub async fn send(&mut self, text: &str) -> DeliveryReport {
        let chunks = chunk_message(text, self.settings.max_units);
        let mut report = DeliveryReport {
            chunks: chunks.len(),
            ..DeliveryReport::default()
        };

        for (index, chunk) in chunks.iter().enumerate() {
            self.wait_for_slot().await;
            let result = self.channel.deliver(chunk).await;
            self.last_sent = Some(Instant::now());
            match result {
                Ok(()) => {
                    report.delivered += 1;
                    engine_debug!(
                        "Delivered chunk {}/{} via {}",
                        index + 1,
                        report.chunks,
                        self.channel.name()
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    engine_warn!(
                        "Notification chunk {}/{} via {} failed: {}",
                        index + 1,
                        report.chunks,
                        self.channel.name(),
                        err
                    );
                }
            }
        }
        report
    }

    async fn wait_for_slot(&self) {
        if let Some(last) = self.last_sent {
            let ready_at = last + self.settings.min_spacing;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }
}
