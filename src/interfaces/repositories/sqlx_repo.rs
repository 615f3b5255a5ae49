use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::repositories::ledger::LedgerRepository;

/// Ledger storage in the `contact_ledgers` table (see `migrations/`).
#[derive(Clone)]
pub struct SqlxLedgerRepo {
    pub pool: PgPool,
}

impl SqlxLedgerRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxLedgerRepo { pool }
    }
}

#[async_trait]
impl LedgerRepository for SqlxLedgerRepo {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        let value: Option<String> = sqlx::query_scalar(
            r#"SELECT value FROM contact_ledgers WHERE key = $1"#
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO contact_ledgers (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query(r#"DELETE FROM contact_ledgers WHERE key = $1"#)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let keys: Vec<String> = sqlx::query_scalar(
            r#"SELECT key FROM contact_ledgers WHERE starts_with(key, $1)"#
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
