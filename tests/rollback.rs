// ABOUTME: Tests for rollback preparation against the mock host.
// ABOUTME: Fail-closed without a previous snapshot; legacy tag key inference.

mod support;

use caravel::release::{ReleaseError, prepare_rollback};
use support::mock_host::MockHost;

const ENV: &str = "/opt/trendradar/.env";
const ENV_PREVIOUS: &str = "/opt/trendradar/.env.previous";

/// Test: With no previous snapshot there is nothing to roll back to; the
/// command fails closed and the host is untouched.
#[tokio::test]
async fn fails_closed_without_previous_snapshot() {
    let config = support::test_config();
    let host = MockHost::with_state(|s| {
        s.files.insert(ENV.to_string(), "VIEWER_TAG=v2.0.0\n".to_string());
    });

    let err = prepare_rollback(&host, &config).await.unwrap_err();
    match err {
        ReleaseError::NoPreviousSnapshot(path) => assert_eq!(path, ENV_PREVIOUS),
        other => panic!("expected NoPreviousSnapshot, got {other:?}"),
    }

    assert!(host.mutating_calls().is_empty());
    assert_eq!(host.file(ENV).as_deref(), Some("VIEWER_TAG=v2.0.0\n"));
}

/// Test: The previous snapshot becomes current again, unrelated keys
/// included, and the returned snapshot carries the old tag.
#[tokio::test]
async fn restores_previous_snapshot_as_current() {
    let config = support::test_config();
    let host = MockHost::with_state(|s| {
        s.files.insert(ENV.to_string(), "VIEWER_TAG=v2.0.0\n".to_string());
        s.files.insert(
            ENV_PREVIOUS.to_string(),
            "VIEWER_TAG=v1.4.0\nDB_URL=postgres://x\n".to_string(),
        );
    });

    let snapshot = prepare_rollback(&host, &config).await.unwrap();

    assert_eq!(snapshot.get("VIEWER_TAG"), Some("v1.4.0"));
    assert_eq!(
        host.file(ENV).as_deref(),
        Some("VIEWER_TAG=v1.4.0\nDB_URL=postgres://x\n")
    );
    // The previous slot itself is left in place.
    assert!(host.file(ENV_PREVIOUS).is_some());
}

/// Test: A snapshot written before the current tag key existed gets its
/// tag inferred from the legacy key rather than rolling back to nothing.
#[tokio::test]
async fn infers_tag_from_legacy_key() {
    let config = support::test_config();
    let host = MockHost::with_state(|s| {
        s.files
            .insert(ENV_PREVIOUS.to_string(), "TAG=v1.2.0\n".to_string());
    });

    let snapshot = prepare_rollback(&host, &config).await.unwrap();

    assert_eq!(snapshot.get("VIEWER_TAG"), Some("v1.2.0"));
    // The legacy entry survives alongside the inferred one.
    assert_eq!(snapshot.get("TAG"), Some("v1.2.0"));
}

/// Test: When the snapshot already has the current tag key, the legacy key
/// is ignored even if present with a different value.
#[tokio::test]
async fn present_tag_key_wins_over_legacy() {
    let config = support::test_config();
    let host = MockHost::with_state(|s| {
        s.files.insert(
            ENV_PREVIOUS.to_string(),
            "TAG=v0.9.0\nVIEWER_TAG=v1.4.0\n".to_string(),
        );
    });

    let snapshot = prepare_rollback(&host, &config).await.unwrap();
    assert_eq!(snapshot.get("VIEWER_TAG"), Some("v1.4.0"));
}

/// Test: An unparseable previous snapshot is an error, not a silent
/// deploy of garbage.
#[tokio::test]
async fn rejects_malformed_previous_snapshot() {
    let config = support::test_config();
    let host = MockHost::with_state(|s| {
        s.files
            .insert(ENV_PREVIOUS.to_string(), "not a pair\n".to_string());
    });

    let err = prepare_rollback(&host, &config).await.unwrap_err();
    assert!(matches!(err, ReleaseError::SnapshotInvalid(_)));
}
