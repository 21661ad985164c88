//! Label synchronization scenarios against the in-memory tracker.

mod common;

use common::{seed_issue, FakeTracker, TEAM_ID};
use linear::{EnsureOptions, LabelSynchronizer};

#[tokio::test]
async fn test_ensure_is_idempotent() {
    let tracker = FakeTracker::new().with_label("bug");
    let sync = LabelSynchronizer::new(&tracker);
    let names = ["bug", "security", "tech-debt"];

    let first = sync
        .ensure_labels_exist(TEAM_ID, &names, EnsureOptions::default())
        .await
        .unwrap();
    assert_eq!(first.created, vec!["security", "tech-debt"]);
    assert_eq!(first.existing, vec!["bug"]);
    assert!(first.failed.is_empty());

    let second = sync
        .ensure_labels_exist(TEAM_ID, &names, EnsureOptions::default())
        .await
        .unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.existing, vec!["bug", "security", "tech-debt"]);
    assert!(second.failed.is_empty());
    assert_eq!(first.label_map, second.label_map);
    assert_eq!(tracker.calls("create_label"), 2);
}

#[tokio::test]
async fn test_case_variants_create_one_label() {
    let tracker = FakeTracker::new();
    let sync = LabelSynchronizer::new(&tracker);

    let result = sync
        .ensure_labels_exist(TEAM_ID, &["Security", "security"], EnsureOptions::default())
        .await
        .unwrap();

    let remote = tracker.labels();
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].name, "Security");
    assert_eq!(result.created, vec!["Security"]);
    assert_eq!(result.label_map.id("Security"), Some(remote[0].id.as_str()));
    assert_eq!(result.label_map.id("security"), Some(remote[0].id.as_str()));
}

#[tokio::test]
async fn test_lost_race_is_reported_as_existing() {
    let tracker = FakeTracker::new();
    tracker.race_on("frontend");
    let sync = LabelSynchronizer::new(&tracker);

    let result = sync
        .ensure_labels_exist(TEAM_ID, &["frontend", "feature"], EnsureOptions::default())
        .await
        .unwrap();

    assert!(result.failed.is_empty());
    assert_eq!(result.existing, vec!["frontend"]);
    assert_eq!(result.created, vec!["feature"]);
    assert_eq!(tracker.labels().len(), 2);
    let winner = tracker
        .labels()
        .into_iter()
        .find(|l| l.name == "frontend")
        .unwrap();
    assert_eq!(result.label_map.id("frontend"), Some(winner.id.as_str()));
    // Both labels resolve after the refresh
    assert!(result.label_map.contains("feature"));
}

#[tokio::test]
async fn test_partial_failure_keeps_going() {
    let tracker = FakeTracker::new();
    tracker.fail_on("api");
    let sync = LabelSynchronizer::new(&tracker);

    let result = sync
        .ensure_labels_exist(TEAM_ID, &["api", "backend"], EnsureOptions::default())
        .await
        .unwrap();

    assert_eq!(result.created, vec!["backend"]);
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].name, "api");
}

#[tokio::test]
async fn test_strict_mode_rejects_unknown_labels() {
    let tracker = FakeTracker::new();
    let sync = LabelSynchronizer::new(&tracker);

    let result = sync
        .ensure_labels_exist(TEAM_ID, &["bug", "urgent"], EnsureOptions::strict())
        .await
        .unwrap();

    assert!(result.created.is_empty());
    assert!(result.existing.is_empty());
    assert_eq!(result.failed.len(), 1);
    assert_eq!(tracker.calls("list_labels"), 0);
    assert!(tracker.labels().is_empty());
}

#[tokio::test]
async fn test_permissive_mode_creates_unknown_labels() {
    let tracker = FakeTracker::new();
    let sync = LabelSynchronizer::new(&tracker);

    let result = sync
        .ensure_labels_exist(TEAM_ID, &["urgent"], EnsureOptions::default())
        .await
        .unwrap();

    assert_eq!(result.created, vec!["urgent"]);
    assert_eq!(
        tracker.labels()[0].color.as_deref(),
        Some(taxonomy::DEFAULT_LABEL_COLOR)
    );
}

#[tokio::test]
async fn test_unknown_team_is_fatal() {
    let tracker = FakeTracker::new();
    let sync = LabelSynchronizer::new(&tracker);

    let err = sync
        .ensure_labels_exist("team-missing", &["bug"], EnsureOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_apply_preserves_existing_labels() {
    let tracker = FakeTracker::new();
    let sync = LabelSynchronizer::new(&tracker);
    let ensured = sync
        .ensure_labels_exist(TEAM_ID, &["bug", "security", "backend"], EnsureOptions::default())
        .await
        .unwrap();

    let issue = seed_issue(&tracker, "Token leak in refresh flow").await;
    tracker.attach(&issue.id, ensured.label_map.id("bug").unwrap());

    let result = sync
        .apply_labels_to_issue(&issue.id, &["security", "bug", "mobile"], &ensured.label_map)
        .await
        .unwrap();

    assert_eq!(result.applied, vec!["security"]);
    assert_eq!(
        result.skipped,
        vec!["bug (already applied)", "mobile (not found in label map)"]
    );
    assert_eq!(tracker.issue_label_names(&issue.id), vec!["bug", "security"]);

    // Re-applying is a no-op and makes no update call
    let updates = tracker.calls("set_issue_labels");
    let again = sync
        .apply_labels_to_issue(&issue.id, &["security"], &ensured.label_map)
        .await
        .unwrap();
    assert!(again.applied.is_empty());
    assert_eq!(tracker.calls("set_issue_labels"), updates);
}
