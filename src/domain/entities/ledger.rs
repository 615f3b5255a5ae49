use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Moment of one successful submission, stored as epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionRecord(pub i64);

impl SubmissionRecord {
    pub fn at(moment: DateTime<Utc>) -> Self {
        SubmissionRecord(moment.timestamp_millis())
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    pub fn is_live(&self, now_ms: i64, window: Duration) -> bool {
        now_ms.saturating_sub(self.0) < window.num_milliseconds()
    }
}

/// Ordered submission history for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionLedger(pub Vec<SubmissionRecord>);

impl SubmissionLedger {
    pub fn pruned(mut self, now_ms: i64, window: Duration) -> Self {
        self.0.retain(|r| r.is_live(now_ms, window));
        self
    }

    pub fn push(&mut self, record: SubmissionRecord) {
        self.0.push(record);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn oldest(&self) -> Option<SubmissionRecord> {
        self.0.first().copied()
    }

    pub fn latest(&self) -> Option<SubmissionRecord> {
        self.0.last().copied()
    }

    pub fn records(&self) -> &[SubmissionRecord] {
        &self.0
    }

    /// Milliseconds until the oldest entry leaves the window; zero when empty.
    pub fn reset_in_ms(&self, now_ms: i64, window: Duration) -> i64 {
        match self.oldest() {
            Some(oldest) => window
                .num_milliseconds()
                .saturating_sub(now_ms.saturating_sub(oldest.0))
                .max(0),
            None => 0,
        }
    }
}

/// Normalized email address to its submission history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailSubmissionLedger(pub BTreeMap<String, SubmissionLedger>);

impl EmailSubmissionLedger {
    /// Prunes every address and drops addresses left with no entries.
    pub fn pruned(self, now_ms: i64, window: Duration) -> Self {
        let cleaned = self
            .0
            .into_iter()
            .map(|(email, ledger)| (email, ledger.pruned(now_ms, window)))
            .filter(|(_, ledger)| !ledger.is_empty())
            .collect();
        EmailSubmissionLedger(cleaned)
    }

    pub fn history(&self, email: &str) -> SubmissionLedger {
        self.0.get(email).cloned().unwrap_or_default()
    }

    pub fn push(&mut self, email: String, record: SubmissionRecord) {
        self.0.entry(email).or_default().push(record);
    }
}

pub fn hours_rounded_up(ms: i64) -> u64 {
    const HOUR_MS: i64 = 60 * 60 * 1000;
    if ms <= 0 {
        0
    } else {
        (ms.saturating_add(HOUR_MS - 1) / HOUR_MS) as u64
    }
}
