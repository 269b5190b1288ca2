//! Watcher engine: page rendering, notification delivery and the monitor loop.
mod decode;
mod fetch;
mod http;
mod monitor;
mod notify;
mod persist;
mod render;
mod retry;
mod types;

pub use decode::decode_body;
pub use fetch::{ContentFetcher, ContentSource, FetchSettings};
pub use http::{HttpRenderer, HttpSettings};
pub use monitor::{CycleReport, Monitor, MonitorSettings, EXTRACTION_SLACK};
pub use notify::{
    DeliveryReport, LogChannel, NotificationChannel, Notifier, NotifierSettings, NotifyError,
    TelegramChannel, TelegramSettings,
};
pub use persist::{PersistError, SnapshotFile};
pub use render::{ChromeRenderer, ChromeSettings, Renderer};
pub use retry::{retry_with_backoff, RetryDecision, RetryPolicy};
pub use types::{CycleError, FailureKind, FetchError, StartupError};
