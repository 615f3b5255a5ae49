#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use mockall::mock;
use portfolio_contact::{
    clock::{Clock, ManualClock},
    entities::{
        contact_me::{ContactMeForm, ContactPayload},
        fingerprint::{ClientEnvironment, SessionFingerprint, StaticProbe},
    },
    errors::AppError,
    repositories::{
        ledger::{LedgerRepository, MemoryLedgerRepo},
        mailer::EmailRelay,
    },
    security::SubmissionPolicy,
    use_cases::contact::{ContactHandler, SubmissionAttempt},
};

mock! {
    pub Relay {}

    #[async_trait]
    impl EmailRelay for Relay {
        async fn send(&self, payload: &ContactPayload) -> Result<(), AppError>;
    }
}

pub const SCOPE: &str = "203.0.113.7";

pub fn test_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap())
}

pub fn relay_ok() -> MockRelay {
    let mut relay = MockRelay::new();
    relay.expect_send().returning(|_| Ok(()));
    relay
}

pub fn relay_failing() -> MockRelay {
    let mut relay = MockRelay::new();
    relay
        .expect_send()
        .returning(|_| Err(AppError::Relay("service unavailable".into())));
    relay
}

pub struct Harness<M: EmailRelay> {
    pub clock: ManualClock,
    pub repo: MemoryLedgerRepo,
    pub handler: Arc<ContactHandler<MemoryLedgerRepo, M>>,
}

impl<M: EmailRelay> Harness<M> {
    pub fn new(relay: M) -> Self {
        let clock = test_clock();
        let repo = MemoryLedgerRepo::new();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let handler = Arc::new(ContactHandler::new(repo.clone(), relay, shared, SubmissionPolicy::default()));
        Harness { clock, repo, handler }
    }

    /// An attempt on a form mounted ten seconds ago.
    pub fn attempt(&self, form: ContactMeForm) -> SubmissionAttempt {
        self.attempt_from(SCOPE, form)
    }

    pub fn attempt_from(&self, scope: &str, form: ContactMeForm) -> SubmissionAttempt {
        SubmissionAttempt {
            scope: scope.to_string(),
            form,
            started_at: self.clock.now() - Duration::seconds(10),
            fingerprint: fingerprint(),
        }
    }

    pub async fn raw(&self, key: &str) -> Option<String> {
        self.repo.read(key).await.unwrap()
    }
}

pub fn fingerprint() -> SessionFingerprint {
    SessionFingerprint::from_probe(&StaticProbe(ClientEnvironment {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64)".into(),
        language: "en-US".into(),
        platform: "Linux".into(),
        screen_resolution: "1920x1080".into(),
        timezone: "Europe/Berlin".into(),
        canvas: "data:image/png;base64,iVBORw0KGgo".into(),
    }))
}

pub fn valid_form() -> ContactMeForm {
    ContactMeForm {
        name: "Jane Doe".into(),
        email: "jane@example.com".into(),
        subject: "Project inquiry".into(),
        message: "I would love to talk about a collaboration.".into(),
        honeypot: String::new(),
    }
}

pub fn form_from(email: &str) -> ContactMeForm {
    ContactMeForm { email: email.into(), ..valid_form() }
}
