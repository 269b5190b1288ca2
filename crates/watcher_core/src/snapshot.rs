use std::collections::btree_set;
use std::collections::BTreeSet;

use crate::NetworkName;

/// The canonical set of network names observed in one cycle.
///
/// Immutable once built; iteration is in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    names: BTreeSet<NetworkName>,
}

impl Snapshot {
    pub fn new(names: BTreeSet<NetworkName>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &NetworkName) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> btree_set::Iter<'_, NetworkName> {
        self.names.iter()
    }

    pub fn as_set(&self) -> &BTreeSet<NetworkName> {
        &self.names
    }

    /// Names as plain strings, in display order.
    pub fn to_strings(&self) -> Vec<String> {
        self.names.iter().map(|n| n.as_str().to_string()).collect()
    }
}

impl FromIterator<NetworkName> for Snapshot {
    fn from_iter<I: IntoIterator<Item = NetworkName>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a NetworkName;
    type IntoIter = btree_set::Iter<'a, NetworkName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

/// Holds the single accepted snapshot. `None` until the first accepted
/// cycle, which is then an initialization rather than a change.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    current: Option<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a previously persisted snapshot.
    pub fn restored(snapshot: Snapshot) -> Self {
        Self {
            current: Some(snapshot),
        }
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.current.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// Replaces the accepted snapshot, returning the one it supersedes.
    pub fn update(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.current.replace(snapshot)
    }
}
