//! Watcher core: pure extraction, diffing and cycle decisions. No I/O.
mod cycle;
mod diff;
mod extract;
mod failure;
mod message;
mod network;
mod rules;
mod snapshot;

pub use cycle::{evaluate_cycle, CycleOutcome, CycleStage, NotifyPolicy};
pub use diff::{diff, ChangeEvent, DiffKind, SnapshotDiff};
pub use extract::{
    collect_text, normalize_candidate, split_boundaries, ExtractionError, NetworkExtractor,
};
pub use failure::{Escalation, FailureState};
pub use message::{
    change_message, chunk_message, escalation_message, fatal_message, heartbeat_message,
    initial_message, recovery_message, startup_message, DEFAULT_MAX_MESSAGE_UNITS,
};
pub use network::{NameError, NetworkName, MAX_NAME_CHARS, MIN_NAME_CHARS};
pub use rules::{ExtractionRules, RulesError};
pub use snapshot::{Snapshot, SnapshotStore};
