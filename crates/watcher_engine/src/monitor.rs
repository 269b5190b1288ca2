//! The monitor loop: one fetch -> extract -> diff -> notify cycle per
//! interval, strictly sequential.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use engine_logging::{engine_error, engine_info, engine_warn};
use watcher_core::{
    change_message, escalation_message, evaluate_cycle, heartbeat_message, recovery_message,
    startup_message, CycleOutcome, CycleStage, Escalation, FailureState, NetworkExtractor,
    NotifyPolicy, Snapshot, SnapshotStore,
};

use crate::{ContentSource, CycleError, FetchSettings, Notifier, SnapshotFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub interval: Duration,
    /// Hard ceiling on fetch plus extraction for one cycle.
    pub cycle_timeout: Duration,
    pub policy: NotifyPolicy,
    pub announce_start: bool,
    /// Send a status line to the channel at the start of every cycle.
    pub heartbeat: bool,
}

/// Headroom on top of the fetch budget for extraction and diffing.
pub const EXTRACTION_SLACK: Duration = Duration::from_secs(30);

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            cycle_timeout: Self::cycle_timeout_for(&FetchSettings::default()),
            policy: NotifyPolicy::default(),
            announce_start: true,
            heartbeat: false,
        }
    }
}

impl MonitorSettings {
    /// A cycle timeout that lets `fetch` run out its whole retry budget.
    pub fn cycle_timeout_for(fetch: &FetchSettings) -> Duration {
        fetch.worst_case() + EXTRACTION_SLACK
    }

    /// False when the cycle timeout would cut `fetch` off before its last
    /// attempt finished.
    pub fn covers(&self, fetch: &FetchSettings) -> bool {
        self.cycle_timeout > fetch.worst_case()
    }
}

/// Result of one cycle, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    Failed { error: CycleError, escalated: bool },
    Initialized { networks: usize, notified: bool },
    Changed { added: usize, removed: usize },
    Unchanged { networks: usize },
}

pub struct Monitor {
    source: Box<dyn ContentSource>,
    extractor: NetworkExtractor,
    notifier: Notifier,
    settings: MonitorSettings,
    store: SnapshotStore,
    failures: FailureState,
    persistence: Option<SnapshotFile>,
    cycle: u64,
}

impl Monitor {
    pub fn new(
        source: Box<dyn ContentSource>,
        extractor: NetworkExtractor,
        notifier: Notifier,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            extractor,
            notifier,
            settings,
            store: SnapshotStore::new(),
            failures: FailureState::new(),
            persistence: None,
            cycle: 0,
        }
    }

    /// Restores the last snapshot from `file` if one is there, and saves to
    /// it after every accepted cycle. An unreadable file means a cold start.
    pub fn with_persistence(mut self, file: SnapshotFile) -> Self {
        match file.load() {
            Ok(Some(names)) => {
                let snapshot = self.extractor.accept_names(names);
                if snapshot.is_empty() {
                    engine_warn!("State file {:?} held no valid networks", file.path());
                } else {
                    engine_info!(
                        "Restored {} networks from {:?}",
                        snapshot.len(),
                        file.path()
                    );
                    self.store = SnapshotStore::restored(snapshot);
                }
            }
            Ok(None) => engine_info!("No state file at {:?}; starting cold", file.path()),
            Err(err) => engine_warn!(
                "Ignoring state file {:?}: {}; starting cold",
                file.path(),
                err
            ),
        }
        self.persistence = Some(file);
        self
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.store.current()
    }

    pub fn failures(&self) -> &FailureState {
        &self.failures
    }

    /// Runs cycles until `shutdown` is cancelled. A cycle in flight at that
    /// point is dropped, which releases its rendering engine.
    pub async fn run(mut self, shutdown: CancellationToken) {
        if self.settings.announce_start {
            let text = startup_message(self.source.target(), self.settings.interval.as_secs());
            self.notifier.send(&text).await;
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    engine_info!("Shutdown requested; abandoning cycle in flight");
                    break;
                }
                report = self.run_cycle() => {
                    engine_info!("Cycle finished: {:?}", report);
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }
        engine_info!("Monitor stopped");
    }

    /// Runs one complete cycle. Never returns an error: failures are folded
    /// into the failure state and reported.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        engine_logging::set_cycle(self.cycle);

        if self.settings.heartbeat {
            let text = heartbeat_message(self.source.target(), Utc::now());
            self.notifier.send(&text).await;
        }

        let extracted =
            match tokio::time::timeout(self.settings.cycle_timeout, self.fetch_and_extract()).await
            {
                Ok(result) => result,
                Err(_) => Err(CycleError::Timeout(self.settings.cycle_timeout)),
            };
        let current = match extracted {
            Ok(snapshot) => snapshot,
            Err(error) => return self.fail(error).await,
        };

        stage(CycleStage::Diffing);
        let outcome = evaluate_cycle(
            self.store.current(),
            current,
            &self.settings.policy,
            Utc::now(),
        );
        let (snapshot, event, report) = match outcome {
            CycleOutcome::EmptyGuard => return self.fail(CycleError::NothingExtracted).await,
            CycleOutcome::Initialized {
                snapshot,
                event,
                notify,
            } => {
                engine_info!("Initial snapshot: {} networks", snapshot.len());
                let report = CycleReport::Initialized {
                    networks: snapshot.len(),
                    notified: notify,
                };
                (snapshot, notify.then_some(event), report)
            }
            CycleOutcome::Changed { snapshot, event } => {
                engine_info!(
                    "Networks changed: +{} -{}",
                    event.added.len(),
                    event.removed.len()
                );
                let report = CycleReport::Changed {
                    added: event.added.len(),
                    removed: event.removed.len(),
                };
                (snapshot, Some(event), report)
            }
            CycleOutcome::Unchanged { snapshot } => {
                engine_info!("No network changes ({} listed)", snapshot.len());
                let report = CycleReport::Unchanged {
                    networks: snapshot.len(),
                };
                (snapshot, None, report)
            }
        };

        if let Some(failed_cycles) = self.failures.record_success() {
            let text = recovery_message(failed_cycles, self.source.target());
            self.notifier.send(&text).await;
        }

        if let Some(event) = event {
            stage(CycleStage::Notifying);
            let text = change_message(&event, self.source.target());
            let delivery = self.notifier.send(&text).await;
            if !delivery.is_complete() {
                engine_warn!(
                    "Change notification only partly delivered ({}/{} chunks); advancing anyway",
                    delivery.delivered,
                    delivery.chunks
                );
            }
        }

        self.accept(snapshot);
        stage(CycleStage::Idle);
        report
    }

    async fn fetch_and_extract(&self) -> Result<Snapshot, CycleError> {
        stage(CycleStage::Fetching);
        let raw = self.source.fetch_content().await?;
        stage(CycleStage::Extracting);
        let snapshot = self.extractor.extract(&raw)?;
        engine_info!("Extracted {} networks", snapshot.len());
        Ok(snapshot)
    }

    fn accept(&mut self, snapshot: Snapshot) {
        if let Some(file) = &self.persistence {
            if let Err(err) = file.save(&snapshot) {
                engine_warn!("Failed to persist snapshot to {:?}: {}", file.path(), err);
            }
        }
        self.store.update(snapshot);
    }

    async fn fail(&mut self, error: CycleError) -> CycleReport {
        engine_error!("Cycle failed: {}", error);
        let escalation = self
            .failures
            .record_failure(&error, self.settings.policy.escalate_every);
        let escalated = escalation == Escalation::Notify;
        if escalated {
            let text = escalation_message(&self.failures, self.source.target());
            self.notifier.send(&text).await;
        } else {
            engine_warn!(
                "{} consecutive failures; escalation deferred",
                self.failures.consecutive_failures()
            );
        }
        stage(CycleStage::Idle);
        CycleReport::Failed { error, escalated }
    }
}

fn stage(stage: CycleStage) {
    engine_info!("Stage: {}", stage);
}
