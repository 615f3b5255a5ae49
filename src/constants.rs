use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Storage key of the per-client submission ledger (suffixed with the client scope).
pub const RATE_LIMIT_KEY: &str = "contact_form_submissions";
/// Storage key of the shared per-email ledger.
pub const EMAIL_TRACKING_KEY: &str = "contact_form_emails";

pub const MAX_SUBMISSIONS: usize = 3;
pub const MAX_SUBMISSIONS_PER_EMAIL: usize = 2;
pub const TIME_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;
pub const MIN_SUBMISSION_INTERVAL_MS: i64 = 60 * 1000;
pub const MIN_FORM_FILL_MS: i64 = 3 * 1000;
pub const COOLDOWN_SECS: u64 = 60;

pub const SPAM_KEYWORDS: [&str; 7] = [
    "viagra",
    "casino",
    "lottery",
    "winner",
    "click here",
    "buy now",
    "limited time",
];
