use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use watcher_core::{
    change_message, evaluate_cycle, CycleOutcome, DiffKind, ExtractionRules, NetworkName,
    NotifyPolicy, Snapshot, SnapshotStore,
};

fn snapshot(names: &[&str]) -> Snapshot {
    let rules = ExtractionRules::default();
    names
        .iter()
        .map(|raw| NetworkName::parse(raw, &rules).expect("valid fixture name"))
        .collect()
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

#[test]
fn empty_extraction_keeps_prior_snapshot_and_sends_nothing() {
    let mut store = SnapshotStore::restored(snapshot(&["Ethereum Mainnet", "Base Chain"]));
    let outcome = evaluate_cycle(
        store.current(),
        Snapshot::default(),
        &NotifyPolicy::default(),
        now(),
    );

    assert_eq!(outcome, CycleOutcome::EmptyGuard);
    assert!(outcome.accepted().is_none());
    assert!(outcome.notification().is_none());
    if let Some(accepted) = outcome.accepted() {
        store.update(accepted.clone());
    }
    assert_eq!(store.current().unwrap().len(), 2);
}

#[test]
fn initialization_respects_policy() {
    let current = snapshot(&["A Mainnet", "B Network"]);

    let quiet = evaluate_cycle(None, current.clone(), &NotifyPolicy::default(), now());
    assert!(matches!(quiet, CycleOutcome::Initialized { notify: false, .. }));
    assert!(quiet.notification().is_none());
    assert_eq!(quiet.accepted(), Some(&current));

    let loud_policy = NotifyPolicy {
        notify_initial: true,
        ..NotifyPolicy::default()
    };
    let loud = evaluate_cycle(None, current.clone(), &loud_policy, now());
    let event = loud.notification().expect("initial event");
    assert_eq!(event.kind, DiffKind::Initialization);
    assert_eq!(event.added.len(), 2);
}

#[test]
fn change_is_notified_and_accepted() {
    let previous = snapshot(&["Ethereum Mainnet", "Polygon Network"]);
    let current = snapshot(&["Polygon Network", "Base Chain"]);
    let outcome = evaluate_cycle(
        Some(&previous),
        current.clone(),
        &NotifyPolicy::default(),
        now(),
    );

    let event = outcome.notification().expect("change event").clone();
    assert_eq!(outcome.accepted(), Some(&current));
    assert_eq!(
        change_message(&event, "https://example.org"),
        "🔔 Network list changed on https://example.org\n\
         \n\
         Added (1):\n\
         + Base Chain\n\
         \n\
         Removed (1):\n\
         - Ethereum Mainnet\n\
         \n\
         2026-10-16T12:00:00Z"
    );
}

#[test]
fn identical_snapshot_is_unchanged() {
    let previous = snapshot(&["Base Chain"]);
    let outcome = evaluate_cycle(
        Some(&previous),
        previous.clone(),
        &NotifyPolicy::default(),
        now(),
    );
    assert_eq!(outcome, CycleOutcome::Unchanged { snapshot: previous });
    assert!(outcome.notification().is_none());
}
