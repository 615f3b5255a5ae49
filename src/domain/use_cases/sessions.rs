use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    entities::{
        contact_me::{ContactMeForm, ContactMeResponse, DraftPatch},
        fingerprint::SessionFingerprint,
        form_session::{FormSession, FormSessionView},
    },
    errors::SubmissionError,
    repositories::{ledger::LedgerRepository, mailer::EmailRelay},
    use_cases::contact::{ContactHandler, SubmissionAttempt},
};

type SharedSession = Arc<Mutex<FormSession>>;

/// Mounted contact forms by session id.
#[derive(Clone, Default)]
pub struct FormSessions {
    map: Arc<DashMap<Uuid, SharedSession>>,
}

impl FormSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(&self, fingerprint: SessionFingerprint, now: DateTime<Utc>) -> FormSessionView {
        let session = FormSession::mount(fingerprint, now);
        let view = session.view();
        self.map.insert(session.id, Arc::new(Mutex::new(session)));
        tracing::debug!(session_id = %view.session_id, fingerprint = %view.fingerprint, "Contact form mounted");
        view
    }

    fn get(&self, id: &Uuid) -> Result<SharedSession, SubmissionError> {
        self.map
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or(SubmissionError::SessionNotFound)
    }

    pub fn view(&self, id: &Uuid) -> Result<FormSessionView, SubmissionError> {
        Ok(self.get(id)?.lock().view())
    }

    pub fn edit(&self, id: &Uuid, patch: DraftPatch, now: DateTime<Utc>) -> Result<FormSessionView, SubmissionError> {
        let session = self.get(id)?;
        let mut session = session.lock();
        session.edit(patch, now);
        Ok(session.view())
    }

    pub fn reset(&self, id: &Uuid, now: DateTime<Utc>) -> Result<FormSessionView, SubmissionError> {
        let session = self.get(id)?;
        let mut session = session.lock();
        session.reset(now);
        Ok(session.view())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Submits the session's draft, or `replacement` if one is given.
    ///
    /// The attempt runs on its own task, so it settles the session (and
    /// charges the quota on success) even when the caller is dropped
    /// mid-send. The session lock is never held across an await; the
    /// `Sending` state is what keeps a second click from sending twice.
    pub async fn submit<R, M>(
        &self,
        id: &Uuid,
        handler: &Arc<ContactHandler<R, M>>,
        scope: &str,
        replacement: Option<ContactMeForm>,
    ) -> Result<ContactMeResponse, SubmissionError>
    where
        R: LedgerRepository + 'static,
        M: EmailRelay + 'static,
    {
        let session = self.get(id)?;

        let attempt = {
            let mut guard = session.lock();
            guard.begin_attempt(handler.clock().now())?;
            if let Some(form) = replacement {
                guard.draft = form;
            }
            SubmissionAttempt {
                scope: scope.to_string(),
                form: guard.draft.clone(),
                started_at: guard.started_at,
                fingerprint: guard.fingerprint.clone(),
            }
        };

        let task = tokio::spawn(run_attempt(Arc::clone(handler), Arc::clone(&session), attempt));

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(session_id = %id, error = %e, "Contact submission task aborted");
                let result = Err(SubmissionError::DeliveryFailed);
                session.lock().finish(&result, handler.clock().now());
                result
            }
        }
    }

    /// Drops sessions idle for longer than `ttl`. Dropping a session cancels its countdown.
    pub fn evict_idle(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.map.len();
        self.map.retain(|_, session| {
            let session = session.lock();
            now.signed_duration_since(session.last_activity) <= ttl
        });
        before.saturating_sub(self.map.len())
    }
}

async fn run_attempt<R, M>(
    handler: Arc<ContactHandler<R, M>>,
    session: SharedSession,
    attempt: SubmissionAttempt,
) -> Result<ContactMeResponse, SubmissionError>
where
    R: LedgerRepository,
    M: EmailRelay,
{
    let result = match handler.screen(attempt).await {
        Ok(screened) => {
            session.lock().mark_sending();
            handler.deliver(screened).await
        }
        Err(e) => Err(e),
    };

    session.lock().finish(&result, handler.clock().now());
    result
}
