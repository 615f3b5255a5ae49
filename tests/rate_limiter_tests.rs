mod test_utils;

use std::sync::Arc;

use chrono::Duration;
use portfolio_contact::{
    clock::{Clock, ManualClock},
    constants::{EMAIL_TRACKING_KEY, RATE_LIMIT_KEY},
    entities::ledger::{hours_rounded_up, SubmissionLedger, SubmissionRecord},
    limiter::rate_limiter::RateLimitStore,
    repositories::ledger::{FileLedgerRepo, LedgerRepository, MemoryLedgerRepo},
    security::SubmissionPolicy,
};
use test_utils::*;

fn store() -> (ManualClock, MemoryLedgerRepo, RateLimitStore<MemoryLedgerRepo>) {
    let clock = test_clock();
    let repo = MemoryLedgerRepo::new();
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let store = RateLimitStore::new(repo.clone(), shared, SubmissionPolicy::default());
    (clock, repo, store)
}

fn global_key(scope: &str) -> String {
    format!("{}:{}", RATE_LIMIT_KEY, urlencoding::encode(scope))
}

#[tokio::test]
async fn recording_then_reading_yields_one_fresh_entry() {
    let (clock, _repo, store) = store();

    let recorded = store.record_global_submission(SCOPE).await.unwrap();
    let history = store.global_history(SCOPE).await;

    assert_eq!(history.len(), 1);
    assert_eq!(history.latest(), Some(recorded));
    assert!((clock.now_millis() - recorded.0).abs() < 5);
}

#[tokio::test]
async fn pruned_history_only_keeps_the_trailing_window() {
    let (clock, _repo, store) = store();

    store.record_global_submission(SCOPE).await.unwrap();
    clock.advance(Duration::hours(12));
    store.record_global_submission(SCOPE).await.unwrap();
    clock.advance(Duration::hours(12));

    let now = clock.now_millis();
    let history = store.global_history(SCOPE).await;

    assert_eq!(history.len(), 1);
    for record in history.records() {
        assert!(now - record.0 < Duration::hours(24).num_milliseconds());
    }
}

#[tokio::test]
async fn three_entries_in_window_trip_the_global_limit() {
    let (clock, _repo, store) = store();

    for _ in 0..3 {
        assert!(!store.is_globally_rate_limited(SCOPE).await);
        store.record_global_submission(SCOPE).await.unwrap();
        clock.advance(Duration::minutes(5));
    }

    assert!(store.is_globally_rate_limited(SCOPE).await);
    assert!(!store.is_globally_rate_limited("198.51.100.1").await);
}

#[tokio::test]
async fn minimum_interval_trips_the_global_limit() {
    let (clock, _repo, store) = store();

    store.record_global_submission(SCOPE).await.unwrap();
    clock.advance(Duration::seconds(59));
    assert!(store.is_globally_rate_limited(SCOPE).await);

    clock.advance(Duration::seconds(1));
    assert!(!store.is_globally_rate_limited(SCOPE).await);
}

#[tokio::test]
async fn email_limit_is_two_per_window_and_case_insensitive() {
    let (clock, _repo, store) = store();

    store.record_email_submission("Jane@Example.com").await.unwrap();
    assert!(!store.is_email_rate_limited("jane@example.com").await);

    clock.advance(Duration::hours(1));
    store.record_email_submission(" jane@example.com ").await.unwrap();
    assert!(store.is_email_rate_limited("JANE@example.COM").await);
    assert!(!store.is_email_rate_limited("john@example.com").await);

    clock.advance(Duration::hours(23));
    assert!(!store.is_email_rate_limited("jane@example.com").await);
}

#[tokio::test]
async fn reset_hours_round_up_from_the_oldest_entry() {
    let (clock, _repo, store) = store();

    assert_eq!(store.reset_window_hours_remaining(SCOPE).await, 0);

    store.record_global_submission(SCOPE).await.unwrap();
    clock.advance(Duration::minutes(90));
    store.record_global_submission(SCOPE).await.unwrap();

    // 22.5 hours left on the oldest entry
    assert_eq!(store.reset_window_hours_remaining(SCOPE).await, 23);
}

#[test]
fn hour_rounding() {
    assert_eq!(hours_rounded_up(0), 0);
    assert_eq!(hours_rounded_up(-5), 0);
    assert_eq!(hours_rounded_up(1), 1);
    assert_eq!(hours_rounded_up(3_600_000), 1);
    assert_eq!(hours_rounded_up(3_600_001), 2);
}

#[tokio::test]
async fn corrupt_ledger_data_reads_as_empty() {
    let (_clock, repo, store) = store();

    repo.write(&global_key(SCOPE), "{not json").await.unwrap();
    repo.write(EMAIL_TRACKING_KEY, "[1, 2, 3]").await.unwrap();

    assert!(store.global_history(SCOPE).await.is_empty());
    assert!(!store.is_globally_rate_limited(SCOPE).await);
    assert!(!store.is_email_rate_limited("jane@example.com").await);

    store.record_global_submission(SCOPE).await.unwrap();
    assert_eq!(store.global_history(SCOPE).await.len(), 1);
}

#[tokio::test]
async fn ledgers_persist_as_json_millisecond_arrays() {
    let (clock, repo, store) = store();

    store.record_global_submission(SCOPE).await.unwrap();
    store.record_email_submission("jane@example.com").await.unwrap();

    let global: Vec<i64> = serde_json::from_str(&repo.read(&global_key(SCOPE)).await.unwrap().unwrap()).unwrap();
    assert_eq!(global, vec![clock.now_millis()]);

    let emails: serde_json::Value =
        serde_json::from_str(&repo.read(EMAIL_TRACKING_KEY).await.unwrap().unwrap()).unwrap();
    assert_eq!(emails["jane@example.com"][0], clock.now_millis());
}

#[tokio::test]
async fn purge_drops_expired_ledgers() {
    let (clock, repo, store) = store();

    store.record_global_submission(SCOPE).await.unwrap();
    store.record_email_submission("jane@example.com").await.unwrap();
    clock.advance(Duration::hours(6));
    store.record_global_submission("198.51.100.1").await.unwrap();
    clock.advance(Duration::hours(20));

    let removed = store.purge_expired().await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(repo.read(&global_key(SCOPE)).await.unwrap(), None);
    assert_eq!(repo.read(EMAIL_TRACKING_KEY).await.unwrap(), None);
    assert_eq!(store.global_history("198.51.100.1").await.len(), 1);
}

#[tokio::test]
async fn clear_forgets_scope_and_emails() {
    let (_clock, _repo, store) = store();

    store.record_global_submission(SCOPE).await.unwrap();
    store.record_email_submission("jane@example.com").await.unwrap();
    store.clear(SCOPE).await.unwrap();

    assert!(store.global_history(SCOPE).await.is_empty());
    assert!(store.email_history("jane@example.com").await.is_empty());
}

#[tokio::test]
async fn file_repo_round_trips_and_lists_keys() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileLedgerRepo::new(dir.path()).await.unwrap();

    assert_eq!(repo.read("contact_form_submissions:10.0.0.1").await.unwrap(), None);

    repo.write("contact_form_submissions:10.0.0.1", "[1]").await.unwrap();
    repo.write(EMAIL_TRACKING_KEY, "{}").await.unwrap();

    assert_eq!(
        repo.read("contact_form_submissions:10.0.0.1").await.unwrap().as_deref(),
        Some("[1]")
    );
    assert_eq!(
        repo.keys("contact_form_submissions:").await.unwrap(),
        vec!["contact_form_submissions:10.0.0.1".to_string()]
    );

    repo.remove("contact_form_submissions:10.0.0.1").await.unwrap();
    repo.remove("contact_form_submissions:10.0.0.1").await.unwrap();
    assert!(repo.keys("contact_form_submissions:").await.unwrap().is_empty());
    assert!(repo.check_connection().await.is_ok());
}

#[test]
fn ledger_prune_keeps_entries_strictly_inside_window() {
    let window = Duration::hours(24);
    let now = 100 * 3_600_000;
    let ledger = SubmissionLedger(vec![
        SubmissionRecord(now - window.num_milliseconds()),
        SubmissionRecord(now - window.num_milliseconds() + 1),
        SubmissionRecord(now),
    ]);

    let pruned = ledger.pruned(now, window);

    assert_eq!(pruned.len(), 2);
    assert_eq!(pruned.oldest(), Some(SubmissionRecord(now - window.num_milliseconds() + 1)));
}

#[test]
fn extreme_stored_timestamps_expire_instead_of_overflowing() {
    let now = test_clock().now_millis();
    let window = Duration::hours(24);

    assert!(!SubmissionRecord(i64::MIN).is_live(now, window));

    let ledger = SubmissionLedger(vec![SubmissionRecord(i64::MIN), SubmissionRecord(now)]);
    let pruned = ledger.pruned(now, window);
    assert_eq!(pruned.records(), &[SubmissionRecord(now)]);

    assert_eq!(SubmissionLedger(vec![SubmissionRecord(i64::MIN)]).reset_in_ms(now, window), 0);
    assert_eq!(hours_rounded_up(i64::MAX), (i64::MAX / 3_600_000) as u64);
}

#[tokio::test]
async fn extreme_stored_timestamps_do_not_trip_the_limits() {
    let (_clock, repo, store) = store();

    let corrupt = format!("[{}, {}, {}]", i64::MIN, i64::MIN, i64::MIN);
    repo.write(&global_key(SCOPE), &corrupt).await.unwrap();
    repo.write(EMAIL_TRACKING_KEY, &format!(r#"{{"jane@example.com": {}}}"#, corrupt)).await.unwrap();

    assert!(store.global_history(SCOPE).await.is_empty());
    assert!(!store.is_globally_rate_limited(SCOPE).await);
    assert!(!store.is_email_rate_limited("jane@example.com").await);
    assert_eq!(store.reset_window_hours_remaining(SCOPE).await, 0);
}
