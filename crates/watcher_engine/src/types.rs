use std::fmt;
use std::time::Duration;

use watcher_core::{ExtractionError, RulesError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The page (or the engine rendering it) did not finish in time.
    Timeout,
    /// The page loaded wrongly: bad status, empty DOM, ready marker missing.
    Navigation,
    /// Transport-level failure reaching the target.
    Network,
    /// The rendering engine failed to launch or crashed.
    Engine,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Navigation => write!(f, "navigation error"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Engine => write!(f, "rendering engine error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A page that failed to load may load on the next attempt; an engine
    /// that failed to launch will not within one cycle.
    pub fn is_retryable(&self) -> bool {
        self.kind != FailureKind::Engine
    }
}

/// Why a single monitor cycle failed. Never fatal to the loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("cycle exceeded its {0:?} budget")]
    Timeout(Duration),
    #[error("page rendered but no networks were extracted")]
    NothingExtracted,
}

/// Conditions that stop the process before the first cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartupError {
    #[error("rendering engine {executable} unavailable: {reason}")]
    EngineUnavailable { executable: String, reason: String },
    #[error("invalid target url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("invalid ready selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("invalid extraction rules: {0}")]
    Rules(#[from] RulesError),
    #[error("http client: {0}")]
    Client(String),
}
