pub mod ledger;
pub mod mailer;
pub mod redis_ledger;
pub mod sqlx_repo;
