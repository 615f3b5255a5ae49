use std::sync::Arc;

use chrono::Duration;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{clock, entities, security, use_cases, validation};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{db, limiter, mailer, utils};

use clock::{Clock, SystemClock};
use errors::AppError;
use mailer::emailjs::EmailJsRelay;
use repositories::{
    ledger::{FileLedgerRepo, LedgerRepository, MemoryLedgerRepo},
    mailer::EmailRelay,
    redis_ledger::RedisLedgerRepo,
    sqlx_repo::SqlxLedgerRepo,
};
use security::SubmissionPolicy;
use settings::{AppConfig, LedgerBackend};
use use_cases::{contact::ContactHandler, sessions::FormSessions};

pub struct AppState {
    pub contact_handler: Arc<AppContactHandler>,
    pub sessions: FormSessions,
    pub trust_x_forwarded_for: bool,
    pub session_ttl: Duration,
}

pub type AppContactHandler = ContactHandler<Arc<dyn LedgerRepository>, Arc<dyn EmailRelay>>;

impl AppState {
    /// Wires the configured ledger backend and the EmailJS relay.
    pub async fn new(config: &settings::AppConfig) -> Result<Self, AppError> {
        let ledger_repo = build_ledger_repo(config).await?;
        let relay: Arc<dyn EmailRelay> = Arc::new(EmailJsRelay::new(config)?);

        Ok(AppState::with_parts(config, ledger_repo, relay, Arc::new(SystemClock)))
    }

    pub fn with_parts(
        config: &AppConfig,
        ledger_repo: Arc<dyn LedgerRepository>,
        relay: Arc<dyn EmailRelay>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        AppState {
            contact_handler: Arc::new(ContactHandler::new(ledger_repo, relay, clock, SubmissionPolicy::default())),
            sessions: FormSessions::new(),
            trust_x_forwarded_for: config.trust_x_forwarded_for,
            session_ttl: Duration::seconds(config.session_ttl_secs as i64),
        }
    }
}

pub async fn build_ledger_repo(config: &AppConfig) -> Result<Arc<dyn LedgerRepository>, AppError> {
    let window_secs = SubmissionPolicy::default().window.num_seconds() as u64;

    let repo: Arc<dyn LedgerRepository> = match config.ledger_backend {
        LedgerBackend::Memory => Arc::new(MemoryLedgerRepo::new()),
        LedgerBackend::File => Arc::new(FileLedgerRepo::new(&config.ledger_dir).await?),
        LedgerBackend::Redis => {
            let url = config.redis_url.as_deref().unwrap_or_default();
            Arc::new(RedisLedgerRepo::new(db::redis::create_redis_pool(url)?, window_secs))
        }
        LedgerBackend::Postgres => {
            let url = config.database_url.as_deref().unwrap_or_default();
            Arc::new(SqlxLedgerRepo::new(db::postgres::create_pool(url).await?))
        }
    };

    tracing::info!(backend = repo.backend_name(), "Ledger storage ready");
    Ok(repo)
}
