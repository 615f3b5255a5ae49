use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    domain::{
        clock::Clock,
        security::{is_honeypot_valid, is_valid_form_timing, SubmissionPolicy},
    },
    entities::{
        contact_me::{ContactMeForm, ContactMeResponse, ContactPayload},
        fingerprint::SessionFingerprint,
    },
    errors::SubmissionError,
    infrastructure::{limiter::rate_limiter::RateLimitStore, utils::sanitize::sanitize_field},
    repositories::{ledger::LedgerRepository, mailer::EmailRelay},
};

/// A submit click: the draft as it stood, who sent it, and when the form mounted.
#[derive(Debug, Clone)]
pub struct SubmissionAttempt {
    pub scope: String,
    pub form: ContactMeForm,
    pub started_at: DateTime<Utc>,
    pub fingerprint: SessionFingerprint,
}

/// An attempt that passed every check and may go to the relay.
#[derive(Debug)]
pub struct ScreenedSubmission {
    scope: String,
    form: ContactMeForm,
    fingerprint: SessionFingerprint,
}

impl ScreenedSubmission {
    pub fn form(&self) -> &ContactMeForm {
        &self.form
    }
}

/// Decides whether a contact submission reaches the email relay.
pub struct ContactHandler<R, M>
where
    R: LedgerRepository,
    M: EmailRelay,
{
    pub limiter: RateLimitStore<R>,
    pub relay: M,
    clock: Arc<dyn Clock>,
}

impl<R, M> ContactHandler<R, M>
where
    R: LedgerRepository,
    M: EmailRelay,
{
    pub fn new(ledger_repo: R, relay: M, clock: Arc<dyn Clock>, policy: SubmissionPolicy) -> Self {
        ContactHandler {
            limiter: RateLimitStore::new(ledger_repo, clock.clone(), policy),
            relay,
            clock,
        }
    }

    pub fn policy(&self) -> &SubmissionPolicy {
        self.limiter.policy()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Runs every check, cheapest first. Honeypot and timing short-circuit
    /// before anything touches storage; field errors come back all at once.
    pub async fn screen(&self, attempt: SubmissionAttempt) -> Result<ScreenedSubmission, SubmissionError> {
        let SubmissionAttempt { scope, form, started_at, fingerprint } = attempt;
        let policy = self.policy();

        if !is_honeypot_valid(&form.honeypot) {
            tracing::info!(%fingerprint, %scope, "Contact submission rejected: honeypot filled");
            return Err(SubmissionError::SpamDetected);
        }

        if !is_valid_form_timing(started_at, self.clock.now(), policy.min_fill_time) {
            tracing::info!(%fingerprint, %scope, "Contact submission rejected: submitted too fast");
            return Err(SubmissionError::TimingTooFast);
        }

        if self.limiter.is_globally_rate_limited(&scope).await {
            let hours = self.limiter.reset_window_hours_remaining(&scope).await;
            tracing::info!(%fingerprint, %scope, hours, "Contact submission rejected: client rate limit");
            return Err(SubmissionError::RateLimited { hours });
        }

        if let Err(errors) = form.validate() {
            tracing::debug!(%fingerprint, "Contact submission rejected: invalid fields");
            return Err(errors.into());
        }

        if self.limiter.is_email_rate_limited(&form.email).await {
            let hours = self.limiter.email_reset_hours_remaining(&form.email).await;
            tracing::info!(%fingerprint, %scope, hours, "Contact submission rejected: email rate limit");
            return Err(SubmissionError::EmailRateLimited { hours });
        }

        if policy.is_prohibited_content(&form.subject, &form.message) {
            tracing::info!(%fingerprint, %scope, "Contact submission rejected: prohibited content");
            return Err(SubmissionError::ContentRejected);
        }

        Ok(ScreenedSubmission { scope, form, fingerprint })
    }

    /// Hands a screened submission to the relay. Only a successful delivery
    /// counts against the client's and the address's quota.
    pub async fn deliver(&self, screened: ScreenedSubmission) -> Result<ContactMeResponse, SubmissionError> {
        let ScreenedSubmission { scope, form, fingerprint } = screened;
        let now = self.clock.now();
        let payload = build_payload(&form, now);

        if let Err(e) = self.relay.send(&payload).await {
            tracing::error!(%fingerprint, %scope, error = %e, "Contact message delivery failed");
            return Err(SubmissionError::DeliveryFailed);
        }

        // The message is already out, so a ledger write failure only gets logged
        if let Err(e) = self.limiter.record_global_submission(&scope).await {
            tracing::error!(%scope, error = %e, "Failed to record client submission");
        }
        if let Err(e) = self.limiter.record_email_submission(&form.email).await {
            tracing::error!(%scope, error = %e, "Failed to record email submission");
        }

        tracing::info!(%fingerprint, %scope, "Contact message delivered");

        Ok(ContactMeResponse {
            message: "Your message has been sent. Thank you!".to_string(),
            sent_at: now,
            cooldown_secs: self.policy().cooldown_secs,
        })
    }

    pub async fn submit(&self, attempt: SubmissionAttempt) -> Result<ContactMeResponse, SubmissionError> {
        let screened = self.screen(attempt).await?;
        self.deliver(screened).await
    }
}

pub fn build_payload(form: &ContactMeForm, now: DateTime<Utc>) -> ContactPayload {
    let from_name = sanitize_field(&form.name);
    let subject = sanitize_field(&form.subject);

    ContactPayload {
        title: format!("New message from {}: {}", from_name, subject),
        from_email: sanitize_field(&form.email),
        message: sanitize_field(&form.message),
        time: now.format("%B %-d, %Y at %H:%M UTC").to_string(),
        from_name,
        subject,
    }
}
