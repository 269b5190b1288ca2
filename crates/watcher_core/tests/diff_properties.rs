use std::collections::BTreeSet;

use chrono::Utc;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use watcher_core::{diff, DiffKind, ExtractionRules, NetworkName, Snapshot};

fn snapshot(names: &[&str]) -> Snapshot {
    let rules = ExtractionRules::default();
    names
        .iter()
        .map(|raw| NetworkName::parse(raw, &rules).expect("valid fixture name"))
        .collect()
}

fn set(names: &[&str]) -> BTreeSet<NetworkName> {
    snapshot(names).as_set().clone()
}

fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    let pool = prop::sample::select(vec![
        "Ethereum Mainnet",
        "Polygon Network",
        "Base Chain",
        "Arbitrum Layer 2",
        "Zora Network",
        "Linea Mainnet",
        "Sonic Chain",
        "Mode Network",
    ]);
    prop::collection::vec(pool, 0..8).prop_map(|names| snapshot(&names))
}

#[test]
fn scenario_steady_state_change() {
    let previous = snapshot(&["Ethereum Mainnet", "Polygon Network"]);
    let current = snapshot(&["Polygon Network", "Base Chain"]);
    let result = diff(Some(&previous), &current);
    assert_eq!(result.added, set(&["Base Chain"]));
    assert_eq!(result.removed, set(&["Ethereum Mainnet"]));
    assert_eq!(result.kind, DiffKind::Change);
}

#[test]
fn scenario_first_run_is_initialization() {
    let current = snapshot(&["A Mainnet", "B Network"]);
    let result = diff(None, &current);
    assert_eq!(result.added, set(&["A Mainnet", "B Network"]));
    assert!(result.removed.is_empty());
    assert_eq!(result.kind, DiffKind::Initialization);
}

#[test]
fn empty_diff_produces_no_event() {
    let current = snapshot(&["Base Chain"]);
    assert!(diff(Some(&current), &current).into_event(Utc::now()).is_none());
}

proptest! {
    #[test]
    fn diff_with_itself_is_empty(s in arb_snapshot()) {
        let result = diff(Some(&s), &s);
        prop_assert!(result.added.is_empty());
        prop_assert!(result.removed.is_empty());
    }

    #[test]
    fn added_and_removed_are_disjoint_from_their_sides(
        previous in arb_snapshot(),
        current in arb_snapshot()
    ) {
        let result = diff(Some(&previous), &current);
        prop_assert!(result.added.iter().all(|n| !previous.contains(n)));
        prop_assert!(result.removed.iter().all(|n| !current.contains(n)));
        prop_assert!(result.added.iter().all(|n| current.contains(n)));
        prop_assert!(result.removed.iter().all(|n| previous.contains(n)));
    }
}
