use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::fs;

use crate::errors::AppError;

/// Raw key/value storage behind the rate-limit ledgers. Values are JSON text.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
    /// Keys currently stored under `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, AppError>;
    async fn check_connection(&self) -> Result<(), AppError>;
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: LedgerRepository + ?Sized> LedgerRepository for Arc<T> {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).write(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        (**self).remove(key).await
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        (**self).keys(prefix).await
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Process-local ledger storage. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryLedgerRepo {
    map: Arc<DashMap<String, String>>,
}

impl MemoryLedgerRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedgerRepo {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.map.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.map.remove(key);
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        Ok(self
            .map
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// One JSON file per key inside `dir`. Keys are URL-encoded into file names.
#[derive(Clone, Debug)]
pub struct FileLedgerRepo {
    dir: PathBuf,
}

impl FileLedgerRepo {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(FileLedgerRepo { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", urlencoding::encode(key)))
    }
}

#[async_trait]
impl LedgerRepository for FileLedgerRepo {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        // Write then rename so a crash never leaves a half-written ledger
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(stem) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if let Ok(key) = urlencoding::decode(stem) {
                if key.starts_with(prefix) {
                    keys.push(key.into_owned());
                }
            }
        }
        Ok(keys)
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        fs::metadata(&self.dir).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
