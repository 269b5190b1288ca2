use std::fmt;

use chrono::{DateTime, Utc};

use crate::{diff, ChangeEvent, Snapshot};

/// Stages of one monitor cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Idle,
    Fetching,
    Extracting,
    Diffing,
    Notifying,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CycleStage::Idle => "idle",
            CycleStage::Fetching => "fetching",
            CycleStage::Extracting => "extracting",
            CycleStage::Diffing => "diffing",
            CycleStage::Notifying => "notifying",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyPolicy {
    /// Push the first accepted snapshot to the channel.
    pub notify_initial: bool,
    /// Escalate on the first failure and every N-th consecutive one.
    pub escalate_every: u32,
}

impl Default for NotifyPolicy {
    fn default() -> Self {
        Self {
            notify_initial: false,
            escalate_every: 5,
        }
    }
}

/// What a cycle should do with a freshly extracted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was extracted. The stored snapshot stays and nothing is sent.
    EmptyGuard,
    /// First accepted snapshot.
    Initialized {
        snapshot: Snapshot,
        event: ChangeEvent,
        notify: bool,
    },
    /// Networks were added or removed; notify, then accept.
    Changed {
        snapshot: Snapshot,
        event: ChangeEvent,
    },
    /// Same set as before.
    Unchanged { snapshot: Snapshot },
}

impl CycleOutcome {
    /// Snapshot to store once the cycle completes, if any.
    pub fn accepted(&self) -> Option<&Snapshot> {
        match self {
            CycleOutcome::EmptyGuard => None,
            CycleOutcome::Initialized { snapshot, .. }
            | CycleOutcome::Changed { snapshot, .. }
            | CycleOutcome::Unchanged { snapshot } => Some(snapshot),
        }
    }

    /// Event to push to the notification channel, if any.
    pub fn notification(&self) -> Option<&ChangeEvent> {
        match self {
            CycleOutcome::Initialized {
                event,
                notify: true,
                ..
            }
            | CycleOutcome::Changed { event, .. } => Some(event),
            _ => None,
        }
    }
}

/// Pure decision for one cycle given the stored and the extracted snapshot.
///
/// An empty extraction never replaces a stored snapshot: a page that
/// rendered nothing is treated as a glitch, not as every network vanishing.
pub fn evaluate_cycle(
    previous: Option<&Snapshot>,
    current: Snapshot,
    policy: &NotifyPolicy,
    now: DateTime<Utc>,
) -> CycleOutcome {
    if current.is_empty() {
        return CycleOutcome::EmptyGuard;
    }

    let initialization = previous.is_none();
    match diff(previous, &current).into_event(now) {
        Some(event) if initialization => CycleOutcome::Initialized {
            snapshot: current,
            event,
            notify: policy.notify_initial,
        },
        Some(event) => CycleOutcome::Changed {
            snapshot: current,
            event,
        },
        None => CycleOutcome::Unchanged { snapshot: current },
    }
}
