use deadpool_redis::{Config, Pool, Runtime};

use crate::errors::AppError;

pub fn create_redis_pool(redis_url: &str) -> Result<Pool, AppError> {
    Config::from_url(redis_url)
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| AppError::Storage(format!("Redis pool creation error: {}", e)))
}
