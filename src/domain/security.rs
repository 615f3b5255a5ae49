//! Cheap bot and abuse heuristics that run independently of rate limits.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{
    COOLDOWN_SECS, MAX_SUBMISSIONS, MAX_SUBMISSIONS_PER_EMAIL, MIN_FORM_FILL_MS,
    MIN_SUBMISSION_INTERVAL_MS, SPAM_KEYWORDS, TIME_WINDOW_MS,
};

/// Limits and thresholds applied by the gatekeeper.
#[derive(Debug, Clone)]
pub struct SubmissionPolicy {
    pub max_submissions: usize,
    pub max_submissions_per_email: usize,
    pub window: Duration,
    pub min_interval: Duration,
    pub min_fill_time: Duration,
    pub cooldown_secs: u64,
    pub spam_keywords: Vec<String>,
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        SubmissionPolicy {
            max_submissions: MAX_SUBMISSIONS,
            max_submissions_per_email: MAX_SUBMISSIONS_PER_EMAIL,
            window: Duration::milliseconds(TIME_WINDOW_MS),
            min_interval: Duration::milliseconds(MIN_SUBMISSION_INTERVAL_MS),
            min_fill_time: Duration::milliseconds(MIN_FORM_FILL_MS),
            cooldown_secs: COOLDOWN_SECS,
            spam_keywords: SPAM_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The decoy field must come back untouched.
pub fn is_honeypot_valid(honeypot: &str) -> bool {
    honeypot.is_empty()
}

/// True when at least `min_fill_time` passed between the form mounting and `now`.
pub fn is_valid_form_timing(
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
    min_fill_time: Duration,
) -> bool {
    now.signed_duration_since(started_at) >= min_fill_time
}

pub fn contains_spam_keywords<S: AsRef<str>>(content: &str, keywords: &[S]) -> bool {
    let lower = content.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_ref()))
}

impl SubmissionPolicy {
    /// Subject and message are checked together, separated by a space.
    pub fn is_prohibited_content(&self, subject: &str, message: &str) -> bool {
        contains_spam_keywords(&format!("{} {}", subject, message), &self.spam_keywords)
    }
}
