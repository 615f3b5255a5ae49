use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    entities::{
        contact_me::{ContactMeForm, ContactMeResponse, DraftPatch},
        fingerprint::SessionFingerprint,
    },
    errors::SubmissionError,
    infrastructure::limiter::cooldown::Countdown,
};

/// `Idle -> Validating -> {Rejected | Sending} -> {Sent | Failed}`.
/// `Rejected`, `Sent` and `Failed` end an attempt; the next one starts over at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Validating,
    Rejected,
    Sending,
    Sent,
    Failed,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Rejected | SubmissionState::Sent | SubmissionState::Failed)
    }
}

/// One mounted contact form.
#[derive(Debug)]
pub struct FormSession {
    pub id: Uuid,
    pub fingerprint: SessionFingerprint,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub draft: ContactMeForm,
    state: SubmissionState,
    last_error: Option<String>,
    cooldown: Countdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSessionView {
    pub session_id: Uuid,
    pub fingerprint: SessionFingerprint,
    pub started_at: DateTime<Utc>,
    pub state: SubmissionState,
    pub draft: ContactMeForm,
    pub last_error: Option<String>,
    pub cooldown_remaining: u64,
}

impl FormSession {
    pub fn mount(fingerprint: SessionFingerprint, now: DateTime<Utc>) -> Self {
        FormSession {
            id: Uuid::new_v4(),
            fingerprint,
            started_at: now,
            last_activity: now,
            draft: ContactMeForm::default(),
            state: SubmissionState::Idle,
            last_error: None,
            cooldown: Countdown::new(),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cooldown_remaining(&self) -> u64 {
        self.cooldown.remaining()
    }

    pub fn cooldown(&self) -> &Countdown {
        &self.cooldown
    }

    pub fn edit(&mut self, patch: DraftPatch, now: DateTime<Utc>) {
        self.draft.apply(patch);
        self.last_activity = now;
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.draft.clear();
        self.last_error = None;
        self.last_activity = now;
    }

    /// Enters `Validating` for a fresh attempt. Refused while a send is in
    /// flight or the post-send cooldown is still counting down.
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) -> Result<(), SubmissionError> {
        if matches!(self.state, SubmissionState::Validating | SubmissionState::Sending) {
            return Err(SubmissionError::SubmissionInProgress);
        }
        if self.cooldown.is_active() {
            return Err(SubmissionError::CooldownActive { seconds: self.cooldown.remaining() });
        }

        self.last_error = None;
        self.last_activity = now;
        self.state = SubmissionState::Validating;
        Ok(())
    }

    pub fn mark_sending(&mut self) {
        debug_assert_eq!(self.state, SubmissionState::Validating);
        self.state = SubmissionState::Sending;
    }

    /// Settles the attempt. Success clears the draft and starts the cooldown.
    pub fn finish(
        &mut self,
        result: &Result<ContactMeResponse, SubmissionError>,
        now: DateTime<Utc>,
    ) {
        self.last_activity = now;
        match result {
            Ok(response) => {
                self.state = SubmissionState::Sent;
                self.draft.clear();
                self.cooldown.start(response.cooldown_secs);
            }
            Err(SubmissionError::DeliveryFailed) => {
                self.state = SubmissionState::Failed;
                self.last_error = Some(SubmissionError::DeliveryFailed.to_string());
            }
            Err(e) => {
                self.state = SubmissionState::Rejected;
                self.last_error = Some(e.to_string());
            }
        }
    }

    pub fn view(&self) -> FormSessionView {
        FormSessionView {
            session_id: self.id,
            fingerprint: self.fingerprint.clone(),
            started_at: self.started_at,
            state: self.state,
            draft: self.draft.clone(),
            last_error: self.last_error.clone(),
            cooldown_remaining: self.cooldown.remaining(),
        }
    }
}
