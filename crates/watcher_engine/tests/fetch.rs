use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;
use watcher_engine::{
    ContentFetcher, ContentSource, FailureKind, FetchError, FetchSettings, Renderer,
    RetryPolicy, StartupError,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

struct ScriptedRenderer {
    pages: Mutex<VecDeque<Result<String, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedRenderer {
    fn new(pages: Vec<Result<String, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, _url: &Url, _timeout: Duration) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::new(FailureKind::Network, "no more pages")))
    }
}

fn settings(ready_selector: Option<&str>) -> FetchSettings {
    FetchSettings {
        url: "https://example.org".to_string(),
        navigation_timeout: Duration::from_secs(10),
        retry: RetryPolicy {
            attempts: 4,
            backoff: Duration::from_secs(3),
            backoff_step: Duration::from_secs(1),
        },
        ready_selector: ready_selector.map(str::to_string),
    }
}

#[tokio::test(start_paused = true)]
async fn polls_until_ready_marker_appears() {
    init_logging();
    let renderer = ScriptedRenderer::new(vec![
        Ok("<div class=\"spinner\"></div>".to_string()),
        Ok("<div class=\"menu collapsed\"></div>".to_string()),
        Ok("<div class=\"menu open\"><span>Base Chain</span></div>".to_string()),
    ]);
    let fetcher = ContentFetcher::new(renderer.clone(), settings(Some("div.menu.open"))).unwrap();

    let started = tokio::time::Instant::now();
    let dom = fetcher.fetch_content().await.unwrap();
    assert!(dom.contains("Base Chain"));
    assert_eq!(renderer.calls(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(3 + 4));
}

#[tokio::test(start_paused = true)]
async fn missing_marker_after_budget_is_a_navigation_error() {
    init_logging();
    let renderer = ScriptedRenderer::new(
        (0..4)
            .map(|_| Ok("<div class=\"spinner\"></div>".to_string()))
            .collect(),
    );
    let fetcher = ContentFetcher::new(renderer.clone(), settings(Some("div.menu"))).unwrap();

    let err = fetcher.fetch_content().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Navigation);
    assert!(err.message.contains("div.menu"));
    assert_eq!(renderer.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_are_retried() {
    init_logging();
    let renderer = ScriptedRenderer::new(vec![
        Err(FetchError::new(FailureKind::Network, "reset")),
        Err(FetchError::new(FailureKind::Timeout, "slow")),
        Ok("Base Chain".to_string()),
    ]);
    let fetcher = ContentFetcher::new(renderer.clone(), settings(None)).unwrap();

    assert_eq!(fetcher.fetch_content().await.unwrap(), "Base Chain");
    assert_eq!(renderer.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn engine_launch_failures_are_not_retried() {
    init_logging();
    let renderer = ScriptedRenderer::new(vec![
        Err(FetchError::new(FailureKind::Engine, "no such file")),
        Ok("Base Chain".to_string()),
    ]);
    let fetcher = ContentFetcher::new(renderer.clone(), settings(None)).unwrap();

    let err = fetcher.fetch_content().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Engine);
    assert_eq!(renderer.calls(), 1);
}

#[test]
fn bad_configuration_is_a_startup_error() {
    let renderer = ScriptedRenderer::new(Vec::new());
    let bad_url = FetchSettings {
        url: "not a url".to_string(),
        ..settings(None)
    };
    assert!(matches!(
        ContentFetcher::new(renderer.clone(), bad_url),
        Err(StartupError::InvalidUrl { .. })
    ));
    assert!(matches!(
        ContentFetcher::new(renderer, settings(Some("div["))),
        Err(StartupError::InvalidSelector { .. })
    ));
}
