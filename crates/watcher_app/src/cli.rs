//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use watcher_core::{ExtractionRules, NotifyPolicy};
use watcher_engine::{
    ChromeSettings, FetchSettings, MonitorSettings, NotifierSettings, RetryPolicy,
    TelegramSettings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererKind {
    /// Headless Chromium, for client-rendered pages.
    Chrome,
    /// Plain HTTP GET, for server-rendered pages.
    Http,
}

/// Watches a web page's network list and reports additions and removals.
#[derive(Debug, Parser)]
#[command(name = "mainnet-watcher", version, about)]
pub struct Cli {
    /// Page to watch
    #[arg(long, env = "TARGET_URL", default_value = "https://dyorswap.org")]
    pub url: String,

    /// Pause between cycles
    #[arg(long, env = "CHECK_INTERVAL", default_value_t = 60_000)]
    pub interval_ms: u64,

    /// Navigation timeout for one page render
    #[arg(long, env = "PAGE_TIMEOUT", default_value_t = 60_000)]
    pub page_timeout_ms: u64,

    /// Hard ceiling on fetch plus extraction for one cycle. Defaults to the
    /// full fetch retry budget plus extraction slack.
    #[arg(long, env = "CYCLE_TIMEOUT")]
    pub cycle_timeout_ms: Option<u64>,

    /// Browser executable
    #[arg(long, env = "CHROME_PATH", default_value = "chromium")]
    pub chrome_path: PathBuf,

    #[arg(long, env = "WATCHER_RENDERER", value_enum, default_value_t = RendererKind::Chrome)]
    pub renderer: RendererKind,

    /// CSS selector that marks the page as rendered
    #[arg(long, env = "READY_SELECTOR")]
    pub ready_selector: Option<String>,

    /// CSS selector matching one network entry each
    #[arg(long, env = "ITEM_SELECTOR")]
    pub item_selector: Option<String>,

    /// Script time the page gets before its DOM is read
    #[arg(long, env = "SETTLE_DELAY", default_value_t = 3_000)]
    pub settle_ms: u64,

    #[arg(long, env = "FETCH_ATTEMPTS", default_value_t = 4)]
    pub fetch_attempts: u32,

    /// Delay before the first retry; each later retry waits one second more
    #[arg(long, env = "FETCH_BACKOFF", default_value_t = 3_000)]
    pub fetch_backoff_ms: u64,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    #[arg(long, env = "TELEGRAM_API_BASE", default_value = "https://api.telegram.org")]
    pub telegram_api: String,

    /// Minimum gap between two pushed messages
    #[arg(long, env = "NOTIFY_SPACING", default_value_t = 1_100)]
    pub min_send_spacing_ms: u64,

    /// Escalate on the first failure and every N-th consecutive one
    #[arg(long, env = "ESCALATE_EVERY", default_value_t = 5)]
    pub escalate_every: u32,

    /// Push the first observed list instead of only logging it
    #[arg(long, env = "NOTIFY_INITIAL", default_value_t = false, action = clap::ArgAction::Set)]
    pub notify_initial: bool,

    /// Push a message when the watcher starts
    #[arg(long, env = "ANNOUNCE_START", default_value_t = true, action = clap::ArgAction::Set)]
    pub announce_start: bool,

    /// Push a status line at the start of every cycle
    #[arg(long, env = "HEARTBEAT", default_value_t = false, action = clap::ArgAction::Set)]
    pub heartbeat: bool,

    /// Where the last accepted list is kept across restarts
    #[arg(long, env = "STATE_FILE")]
    pub state_file: Option<PathBuf>,

    #[arg(long, env = "WATCHER_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "WATCHER_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            url: self.url.clone(),
            navigation_timeout: Duration::from_millis(self.page_timeout_ms),
            retry: RetryPolicy {
                attempts: self.fetch_attempts,
                backoff: Duration::from_millis(self.fetch_backoff_ms),
                backoff_step: Duration::from_secs(1),
            },
            ready_selector: self.ready_selector.clone(),
        }
    }

    pub fn chrome_settings(&self) -> ChromeSettings {
        ChromeSettings {
            executable: self.chrome_path.clone(),
            settle_delay: Duration::from_millis(self.settle_ms),
            ..ChromeSettings::default()
        }
    }

    pub fn extraction_rules(&self) -> ExtractionRules {
        ExtractionRules {
            item_selector: self.item_selector.clone(),
            ..ExtractionRules::default()
        }
    }

    pub fn notifier_settings(&self) -> NotifierSettings {
        NotifierSettings {
            min_spacing: Duration::from_millis(self.min_send_spacing_ms),
            ..NotifierSettings::default()
        }
    }

    /// Push credentials, when both halves are present and non-blank.
    pub fn telegram_settings(&self) -> Option<TelegramSettings> {
        let token = self.telegram_token.as_deref().map(str::trim)?;
        let chat_id = self.telegram_chat_id.as_deref().map(str::trim)?;
        if token.is_empty() || chat_id.is_empty() {
            return None;
        }
        Some(TelegramSettings {
            api_base: self.telegram_api.clone(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
            request_timeout: Duration::from_secs(15),
        })
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_millis(self.interval_ms),
            cycle_timeout: match self.cycle_timeout_ms {
                Some(ms) => Duration::from_millis(ms),
                None => MonitorSettings::cycle_timeout_for(&self.fetch_settings()),
            },
            policy: NotifyPolicy {
                notify_initial: self.notify_initial,
                escalate_every: self.escalate_every,
            },
            announce_start: self.announce_start,
            heartbeat: self.heartbeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["mainnet-watcher"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid arguments")
    }

    #[test]
    fn flags_map_onto_settings() {
        let cli = parse(&[
            "--url",
            "https://example.org",
            "--interval-ms",
            "5000",
            "--fetch-attempts",
            "3",
            "--notify-initial",
            "true",
            "--renderer",
            "http",
            "--item-selector",
            "div.item",
        ]);

        assert_eq!(cli.renderer, RendererKind::Http);
        assert_eq!(cli.fetch_settings().url, "https://example.org");
        assert_eq!(cli.fetch_settings().retry.attempts, 3);
        assert_eq!(cli.monitor_settings().interval, Duration::from_secs(5));
        assert!(cli.monitor_settings().policy.notify_initial);
        assert_eq!(
            cli.extraction_rules().item_selector.as_deref(),
            Some("div.item")
        );
    }

    #[test]
    fn half_configured_telegram_means_log_only() {
        let cli = parse(&["--telegram-token", "123:abc", "--telegram-chat-id", "  "]);
        assert!(cli.telegram_settings().is_none());

        let cli = parse(&["--telegram-token", "123:abc", "--telegram-chat-id", "42"]);
        let telegram = cli.telegram_settings().expect("credentials");
        assert_eq!(telegram.chat_id, "42");
    }

    #[test]
    fn default_cycle_timeout_covers_every_fetch_attempt() {
        let cli = parse(&["--page-timeout-ms", "10000", "--fetch-attempts", "2"]);
        let fetch = cli.fetch_settings();
        let monitor = cli.monitor_settings();

        // 2 x 10s renders plus one 3s backoff, then extraction slack.
        assert_eq!(fetch.worst_case(), Duration::from_secs(23));
        assert_eq!(monitor.cycle_timeout, Duration::from_secs(53));
        assert!(monitor.covers(&fetch));
    }

    #[test]
    fn explicit_cycle_timeout_wins() {
        let cli = parse(&["--cycle-timeout-ms", "90000"]);
        let monitor = cli.monitor_settings();
        assert_eq!(monitor.cycle_timeout, Duration::from_secs(90));
        assert!(!monitor.covers(&cli.fetch_settings()));
    }
}
