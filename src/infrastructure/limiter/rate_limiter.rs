use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    constants::{EMAIL_TRACKING_KEY, RATE_LIMIT_KEY},
    domain::{clock::Clock, security::SubmissionPolicy},
    entities::{
        contact_me::normalize_email,
        ledger::{hours_rounded_up, EmailSubmissionLedger, SubmissionLedger, SubmissionRecord},
    },
    errors::AppError,
    repositories::ledger::LedgerRepository,
};

/// Trailing-window submission counters, per client scope and per email address.
///
/// Every read prunes entries older than the window before anything is
/// evaluated. Stored data that cannot be read or parsed counts as an empty
/// ledger: the counts restart rather than the form breaking.
pub struct RateLimitStore<R>
where
    R: LedgerRepository,
{
    repo: R,
    clock: Arc<dyn Clock>,
    policy: SubmissionPolicy,
}

impl<R> RateLimitStore<R>
where
    R: LedgerRepository,
{
    pub fn new(repo: R, clock: Arc<dyn Clock>, policy: SubmissionPolicy) -> Self {
        RateLimitStore { repo, clock, policy }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn policy(&self) -> &SubmissionPolicy {
        &self.policy
    }

    fn global_key(scope: &str) -> String {
        format!("{}:{}", RATE_LIMIT_KEY, urlencoding::encode(scope))
    }

    async fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let raw = match self.repo.read(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "Ledger read failed, treating as empty");
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Corrupt ledger data, treating as empty");
            T::default()
        })
    }

    async fn store<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::InternalError(format!("Ledger serialization failed: {}", e)))?;
        self.repo.write(key, &json).await
    }

    /// Live global entries for `scope`, oldest first.
    pub async fn global_history(&self, scope: &str) -> SubmissionLedger {
        let ledger: SubmissionLedger = self.load(&Self::global_key(scope)).await;
        ledger.pruned(self.clock.now_millis(), self.policy.window)
    }

    async fn email_ledger(&self) -> EmailSubmissionLedger {
        let ledger: EmailSubmissionLedger = self.load(EMAIL_TRACKING_KEY).await;
        ledger.pruned(self.clock.now_millis(), self.policy.window)
    }

    /// Live entries for one address, oldest first.
    pub async fn email_history(&self, email: &str) -> SubmissionLedger {
        self.email_ledger().await.history(&normalize_email(email))
    }

    pub async fn record_global_submission(&self, scope: &str) -> Result<SubmissionRecord, AppError> {
        let mut ledger = self.global_history(scope).await;
        let record = SubmissionRecord::at(self.clock.now());
        ledger.push(record);
        self.store(&Self::global_key(scope), &ledger).await?;
        Ok(record)
    }

    pub async fn record_email_submission(&self, email: &str) -> Result<SubmissionRecord, AppError> {
        let mut ledger = self.email_ledger().await;
        let record = SubmissionRecord::at(self.clock.now());
        ledger.push(normalize_email(email), record);
        self.store(EMAIL_TRACKING_KEY, &ledger).await?;
        Ok(record)
    }

    /// Tripped by too many entries in the window, or by the latest entry being too recent.
    pub async fn is_globally_rate_limited(&self, scope: &str) -> bool {
        let history = self.global_history(scope).await;

        if history.len() >= self.policy.max_submissions {
            return true;
        }

        match history.latest() {
            Some(last) => {
                self.clock.now_millis().saturating_sub(last.0) < self.policy.min_interval.num_milliseconds()
            }
            None => false,
        }
    }

    pub async fn is_email_rate_limited(&self, email: &str) -> bool {
        self.email_history(email).await.len() >= self.policy.max_submissions_per_email
    }

    /// Hours, rounded up, until the oldest global entry for `scope` expires. Zero when empty.
    pub async fn reset_window_hours_remaining(&self, scope: &str) -> u64 {
        let history = self.global_history(scope).await;
        hours_rounded_up(history.reset_in_ms(self.clock.now_millis(), self.policy.window))
    }

    pub async fn email_reset_hours_remaining(&self, email: &str) -> u64 {
        let history = self.email_history(email).await;
        hours_rounded_up(history.reset_in_ms(self.clock.now_millis(), self.policy.window))
    }

    /// Rewrites every stored ledger with only its live entries, dropping the
    /// empty ones. Returns how many ledgers were removed.
    pub async fn purge_expired(&self) -> Result<usize, AppError> {
        let mut removed = 0;

        for key in self.repo.keys(&format!("{}:", RATE_LIMIT_KEY)).await? {
            let ledger: SubmissionLedger = self.load(&key).await;
            let pruned = ledger.clone().pruned(self.clock.now_millis(), self.policy.window);
            if pruned.is_empty() {
                self.repo.remove(&key).await?;
                removed += 1;
            } else if pruned != ledger {
                self.store(&key, &pruned).await?;
            }
        }

        let emails = self.email_ledger().await;
        if emails.0.is_empty() {
            self.repo.remove(EMAIL_TRACKING_KEY).await?;
        } else {
            self.store(EMAIL_TRACKING_KEY, &emails).await?;
        }

        Ok(removed)
    }

    /// Forgets the scope's submissions and every per-email entry.
    pub async fn clear(&self, scope: &str) -> Result<(), AppError> {
        self.repo.remove(&Self::global_key(scope)).await?;
        self.repo.remove(EMAIL_TRACKING_KEY).await
    }
}
