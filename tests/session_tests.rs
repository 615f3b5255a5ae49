mod test_utils;

use std::{sync::Arc, time::Duration as StdDuration};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use portfolio_contact::{
    clock::Clock,
    entities::{
        contact_me::{ContactMeResponse, ContactPayload, DraftPatch},
        form_session::{FormSession, SubmissionState},
    },
    errors::{AppError, SubmissionError},
    limiter::cooldown::Countdown,
    repositories::mailer::EmailRelay,
    use_cases::sessions::FormSessions,
};
use tokio::sync::Notify;
use test_utils::*;
use uuid::Uuid;

/// Holds every send until the gate is opened.
struct GatedRelay {
    gate: Arc<Notify>,
    fail: bool,
}

#[async_trait]
impl EmailRelay for GatedRelay {
    async fn send(&self, _payload: &ContactPayload) -> Result<(), AppError> {
        self.gate.notified().await;
        if self.fail {
            Err(AppError::Relay("connection reset".into()))
        } else {
            Ok(())
        }
    }
}

async fn wait_while_sending(sessions: &FormSessions, id: &Uuid) -> SubmissionState {
    for _ in 0..200 {
        let state = sessions.view(id).unwrap().state;
        if state != SubmissionState::Sending {
            return state;
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
    sessions.view(id).unwrap().state
}

fn sent(cooldown_secs: u64) -> Result<ContactMeResponse, SubmissionError> {
    Ok(ContactMeResponse {
        message: "Your message has been sent. Thank you!".into(),
        sent_at: Utc::now(),
        cooldown_secs,
    })
}

#[tokio::test(start_paused = true)]
async fn countdown_ticks_down_once_a_second() {
    let mut countdown = Countdown::new();
    let mut rx = countdown.subscribe();

    countdown.start(3);
    assert_eq!(countdown.remaining(), 3);

    let mut seen = Vec::new();
    while rx.changed().await.is_ok() {
        let left = *rx.borrow_and_update();
        seen.push(left);
        if left == 0 {
            break;
        }
    }

    assert_eq!(seen.last(), Some(&0));
    assert!(!countdown.is_active());
}

#[tokio::test(start_paused = true)]
async fn restarting_replaces_the_running_countdown() {
    let mut countdown = Countdown::new();

    countdown.start(60);
    tokio::time::sleep(StdDuration::from_millis(10_500)).await;
    assert_eq!(countdown.remaining(), 50);

    countdown.start(5);
    tokio::time::sleep(StdDuration::from_millis(2_500)).await;
    assert_eq!(countdown.remaining(), 3);

    countdown.cancel();
    assert_eq!(countdown.remaining(), 0);
    tokio::time::sleep(StdDuration::from_secs(2)).await;
    assert_eq!(countdown.remaining(), 0);
}

#[tokio::test(start_paused = true)]
async fn session_refuses_a_second_attempt_while_one_is_running() {
    let now = test_clock().now();
    let mut session = FormSession::mount(fingerprint(), now);

    session.begin_attempt(now).unwrap();
    assert_eq!(session.state(), SubmissionState::Validating);
    assert!(matches!(session.begin_attempt(now), Err(SubmissionError::SubmissionInProgress)));

    session.mark_sending();
    assert!(matches!(session.begin_attempt(now), Err(SubmissionError::SubmissionInProgress)));
}

#[tokio::test(start_paused = true)]
async fn successful_send_starts_the_cooldown() {
    let now = test_clock().now();
    let mut session = FormSession::mount(fingerprint(), now);
    session.edit(DraftPatch { name: Some("Jane Doe".into()), ..DraftPatch::default() }, now);

    session.begin_attempt(now).unwrap();
    session.mark_sending();
    session.finish(&sent(60), now);

    assert_eq!(session.state(), SubmissionState::Sent);
    assert!(session.state().is_terminal());
    assert_eq!(session.draft.name, "");
    assert!(matches!(
        session.begin_attempt(now),
        Err(SubmissionError::CooldownActive { seconds: 60 })
    ));

    tokio::time::sleep(StdDuration::from_secs(61)).await;
    assert_eq!(session.cooldown_remaining(), 0);
    session.begin_attempt(now).unwrap();
    assert_eq!(session.state(), SubmissionState::Validating);
}

#[tokio::test]
async fn failures_keep_the_draft_and_record_the_message() {
    let now = test_clock().now();
    let mut session = FormSession::mount(fingerprint(), now);
    session.edit(DraftPatch { subject: Some("Project inquiry".into()), ..DraftPatch::default() }, now);

    session.begin_attempt(now).unwrap();
    session.mark_sending();
    session.finish(&Err(SubmissionError::DeliveryFailed), now);
    assert_eq!(session.state(), SubmissionState::Failed);
    assert_eq!(session.last_error(), Some("Failed to send message. Please try again later."));
    assert_eq!(session.draft.subject, "Project inquiry");

    session.begin_attempt(now).unwrap();
    assert_eq!(session.last_error(), None);
    session.finish(&Err(SubmissionError::TimingTooFast), now);
    assert_eq!(session.state(), SubmissionState::Rejected);
    assert_eq!(session.cooldown_remaining(), 0);
}

#[tokio::test]
async fn registry_submits_the_stored_draft() {
    let harness = Harness::new(relay_ok());
    let sessions = FormSessions::new();
    let view = sessions.mount(fingerprint(), harness.clock.now());

    let form = valid_form();
    sessions
        .edit(
            &view.session_id,
            DraftPatch {
                name: Some(form.name),
                email: Some(form.email),
                subject: Some(form.subject),
                message: Some(form.message),
                honeypot: None,
            },
            harness.clock.now(),
        )
        .unwrap();
    harness.clock.advance(Duration::seconds(20));

    let response = sessions.submit(&view.session_id, &harness.handler, SCOPE, None).await.unwrap();
    assert_eq!(response.cooldown_secs, 60);

    let after = sessions.view(&view.session_id).unwrap();
    assert_eq!(after.state, SubmissionState::Sent);
    assert_eq!(after.draft, Default::default());
    assert!(matches!(
        sessions.submit(&view.session_id, &harness.handler, SCOPE, Some(valid_form())).await,
        Err(SubmissionError::CooldownActive { .. })
    ));
}

#[tokio::test]
async fn rejected_attempt_leaves_the_session_reusable() {
    let harness = Harness::new(relay_ok());
    let sessions = FormSessions::new();
    let view = sessions.mount(fingerprint(), harness.clock.now());

    let err = sessions
        .submit(&view.session_id, &harness.handler, SCOPE, Some(valid_form()))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::TimingTooFast));
    assert_eq!(sessions.view(&view.session_id).unwrap().state, SubmissionState::Rejected);

    harness.clock.advance(Duration::seconds(5));
    sessions.submit(&view.session_id, &harness.handler, SCOPE, None).await.unwrap();
}

#[test]
fn idle_sessions_are_evicted() {
    let clock = test_clock();
    let sessions = FormSessions::new();
    let stale = sessions.mount(fingerprint(), clock.now());
    clock.advance(Duration::minutes(50));
    let fresh = sessions.mount(fingerprint(), clock.now());
    clock.advance(Duration::minutes(20));

    let removed = sessions.evict_idle(Duration::hours(1), clock.now());

    assert_eq!(removed, 1);
    assert!(matches!(sessions.view(&stale.session_id), Err(SubmissionError::SessionNotFound)));
    assert!(sessions.view(&fresh.session_id).is_ok());
}

#[tokio::test]
async fn abandoned_submit_still_delivers_and_charges_the_quota() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::new(GatedRelay { gate: Arc::clone(&gate), fail: false });
    let sessions = FormSessions::new();
    let id = sessions.mount(fingerprint(), harness.clock.now()).session_id;
    harness.clock.advance(Duration::seconds(10));

    // The caller gives up while the relay is still working
    let abandoned = tokio::time::timeout(
        StdDuration::from_millis(50),
        sessions.submit(&id, &harness.handler, SCOPE, Some(valid_form())),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(sessions.view(&id).unwrap().state, SubmissionState::Sending);

    gate.notify_one();

    assert_eq!(wait_while_sending(&sessions, &id).await, SubmissionState::Sent);
    assert_eq!(harness.handler.limiter.global_history(SCOPE).await.len(), 1);
    assert_eq!(harness.handler.limiter.email_history("jane@example.com").await.len(), 1);
}

#[tokio::test]
async fn abandoned_failed_submit_leaves_the_session_reusable() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::new(GatedRelay { gate: Arc::clone(&gate), fail: true });
    let sessions = FormSessions::new();
    let id = sessions.mount(fingerprint(), harness.clock.now()).session_id;
    harness.clock.advance(Duration::seconds(10));

    let abandoned = tokio::time::timeout(
        StdDuration::from_millis(50),
        sessions.submit(&id, &harness.handler, SCOPE, Some(valid_form())),
    )
    .await;
    assert!(abandoned.is_err());

    gate.notify_one();
    assert_eq!(wait_while_sending(&sessions, &id).await, SubmissionState::Failed);
    assert!(harness.handler.limiter.global_history(SCOPE).await.is_empty());

    harness.clock.advance(Duration::hours(48));
    gate.notify_one();
    let retry = sessions.submit(&id, &harness.handler, SCOPE, None).await;
    assert!(matches!(retry, Err(SubmissionError::DeliveryFailed)));
}
