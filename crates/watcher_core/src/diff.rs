use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::{NetworkName, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    /// No prior snapshot existed; everything current counts as added.
    Initialization,
    /// Steady-state comparison against an accepted snapshot.
    Change,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub added: BTreeSet<NetworkName>,
    pub removed: BTreeSet<NetworkName>,
    pub kind: DiffKind,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Stamps a non-empty diff as a change event.
    pub fn into_event(self, timestamp: DateTime<Utc>) -> Option<ChangeEvent> {
        if self.is_empty() {
            return None;
        }
        Some(ChangeEvent {
            added: self.added,
            removed: self.removed,
            kind: self.kind,
            timestamp,
        })
    }
}

/// A non-empty difference between two cycles, ready for notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub added: BTreeSet<NetworkName>,
    pub removed: BTreeSet<NetworkName>,
    pub kind: DiffKind,
    pub timestamp: DateTime<Utc>,
}

/// `added = current - previous`, `removed = previous - current`.
pub fn diff(previous: Option<&Snapshot>, current: &Snapshot) -> SnapshotDiff {
    match previous {
        None => SnapshotDiff {
            added: current.as_set().clone(),
            removed: BTreeSet::new(),
            kind: DiffKind::Initialization,
        },
        Some(previous) => SnapshotDiff {
            added: current
                .as_set()
                .difference(previous.as_set())
                .cloned()
                .collect(),
            removed: previous
                .as_set()
                .difference(current.as_set())
                .cloned()
                .collect(),
            kind: DiffKind::Change,
        },
    }
}
