use std::sync::Arc;
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use engine_logging::{engine_debug, engine_info};

use crate::{
    retry_with_backoff, FailureKind, FetchError, Renderer, RetryDecision, RetryPolicy,
    StartupError,
};

/// Source of raw page content for one cycle.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_content(&self) -> Result<String, FetchError>;

    /// Human-readable target, used in notifications.
    fn target(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub url: String,
    pub navigation_timeout: Duration,
    pub retry: RetryPolicy,
    /// CSS selector that must be present before the page counts as rendered.
    pub ready_selector: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            url: "https://dyorswap.org".to_string(),
            navigation_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            ready_selector: None,
        }
    }
}

impl FetchSettings {
    /// Longest a fetch can take when every attempt runs into its timeout.
    pub fn worst_case(&self) -> Duration {
        self.navigation_timeout * self.retry.attempts.max(1) + self.retry.total_backoff()
    }
}

/// Renders the target with retries, polling until the ready marker shows up.
pub struct ContentFetcher {
    renderer: Arc<dyn Renderer>,
    url: Url,
    settings: FetchSettings,
}

impl ContentFetcher {
    pub fn new(renderer: Arc<dyn Renderer>, settings: FetchSettings) -> Result<Self, StartupError> {
        let url = Url::parse(&settings.url).map_err(|err| StartupError::InvalidUrl {
            url: settings.url.clone(),
            message: err.to_string(),
        })?;
        if let Some(raw) = settings.ready_selector.as_deref() {
            Selector::parse(raw).map_err(|err| StartupError::InvalidSelector {
                selector: raw.to_string(),
                message: err.to_string(),
            })?;
        }
        Ok(Self {
            renderer,
            url,
            settings,
        })
    }

    fn is_ready(&self, dom: &str) -> bool {
        let Some(raw) = self.settings.ready_selector.as_deref() else {
            return true;
        };
        marker_present(dom, raw)
    }
}

/// True when `selector` matches at least one element of `dom`.
fn marker_present(dom: &str, selector: &str) -> bool {
    match Selector::parse(selector) {
        Ok(selector) => Html::parse_document(dom).select(&selector).next().is_some(),
        Err(_) => false,
    }
}

#[async_trait::async_trait]
impl ContentSource for ContentFetcher {
    async fn fetch_content(&self) -> Result<String, FetchError> {
        let renderer = &self.renderer;
        let url = &self.url;
        let timeout = self.settings.navigation_timeout;

        let dom = retry_with_backoff(
            &self.settings.retry,
            "fetch",
            |attempt| async move {
                engine_debug!("Rendering {} (attempt {})", url, attempt);
                renderer.render(url, timeout).await
            },
            |result| match result {
                Ok(dom) if !self.is_ready(dom) => RetryDecision::Retry,
                Ok(_) => RetryDecision::Done,
                Err(err) if err.is_retryable() => RetryDecision::Retry,
                Err(_) => RetryDecision::Done,
            },
        )
        .await?;

        if !self.is_ready(&dom) {
            return Err(FetchError::new(
                FailureKind::Navigation,
                format!(
                    "ready marker {:?} missing after {} attempt(s)",
                    self.settings.ready_selector.as_deref().unwrap_or_default(),
                    self.settings.retry.attempts.max(1)
                ),
            ));
        }
        engine_info!("Rendered {} ({} bytes)", self.url, dom.len());
        Ok(dom)
    }

    fn target(&self) -> &str {
        self.url.as_str()
    }
}
