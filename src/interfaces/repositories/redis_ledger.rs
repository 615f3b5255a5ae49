use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::errors::AppError;
use crate::repositories::ledger::LedgerRepository;

/// Ledger storage in Redis. Every write refreshes the key's TTL, so a ledger
/// nobody touches for a whole window expires on its own.
#[derive(Clone)]
pub struct RedisLedgerRepo {
    pool: Pool,
    ttl_secs: u64,
}

impl RedisLedgerRepo {
    pub fn new(pool: Pool, ttl_secs: u64) -> Self {
        RedisLedgerRepo { pool, ttl_secs }
    }
}

#[async_trait]
impl LedgerRepository for RedisLedgerRepo {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.set_ex(key, value, self.ttl_secs).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.pool.get().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let mut conn = self.pool.get().await?;
        let keys: Vec<String> = conn.keys(format!("{}*", prefix)).await?;
        Ok(keys)
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        let mut conn = self.pool.get().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(AppError::Storage(format!("Unexpected PING reply: {}", pong)))
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
