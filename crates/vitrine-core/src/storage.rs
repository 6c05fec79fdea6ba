use std::{convert::Infallible, path::Path, sync::Arc};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use libsql::{Builder, Connection, Database as LibSqlDatabase, params};
use thiserror::Error;

/// Key under which the bearer token is persisted, matching the original
/// browser storage contract.
pub const TOKEN_KEY: &str = "token";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to build storage database: {0}")]
    Build(libsql::Error),
    #[error("failed to open connection: {0}")]
    Connect(libsql::Error),
    #[error("failed to execute statement: {0}")]
    Statement(libsql::Error),
}

/// Local persisted key-value storage, the `localStorage` analogue for the
/// client. Cheap to clone; all clones share the same database handle.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<LibSqlDatabase>,
}

impl Storage {
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let path_str = path.to_string_lossy().to_string();
        let inner = Builder::new_local(path_str)
            .build()
            .await
            .map_err(StorageError::Build)?;

        let storage = Self {
            inner: Arc::new(inner),
        };
        storage.ensure_schema().await?;
        Ok(storage)
    }

    async fn connection(&self) -> Result<Connection, StorageError> {
        self.inner.connect().map_err(StorageError::Connect)
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let conn = self.connection().await?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            (),
        )
        .await
        .map_err(StorageError::Statement)?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query("SELECT value FROM kv WHERE key = ?1", params![key])
            .await
            .map_err(StorageError::Statement)?;

        match rows.next().await.map_err(StorageError::Statement)? {
            Some(row) => {
                let value: String = row.get(0).map_err(StorageError::Statement)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let conn = self.connection().await?;
        conn.execute(
            "INSERT INTO kv (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value, now],
        )
        .await
        .map_err(StorageError::Statement)?;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.connection().await?;
        conn.execute("DELETE FROM kv WHERE key = ?1", params![key])
            .await
            .map_err(StorageError::Statement)?;
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), StorageError> {
        let conn = self.connection().await?;
        let mut rows = conn
            .query("SELECT 1", ())
            .await
            .map_err(StorageError::Statement)?;
        let _ = rows.next().await.map_err(StorageError::Statement)?;
        Ok(())
    }
}

/// Credential source injected into the API client at construction. The client
/// reads through it on every call and never refreshes or validates expiry.
#[async_trait]
pub trait TokenStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn load_token(&self) -> Result<Option<String>, Self::Error>;

    async fn save_token(&self, token: &str) -> Result<(), Self::Error>;

    async fn clear_token(&self) -> Result<(), Self::Error>;
}

#[async_trait]
impl TokenStore for Storage {
    type Error = StorageError;

    async fn load_token(&self) -> Result<Option<String>, Self::Error> {
        self.get(TOKEN_KEY).await
    }

    async fn save_token(&self, token: &str) -> Result<(), Self::Error> {
        self.set(TOKEN_KEY, token).await
    }

    async fn clear_token(&self) -> Result<(), Self::Error> {
        self.remove(TOKEN_KEY).await
    }
}

/// Fixed in-memory credential, for tests and sessions that never persist.
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn absent() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl TokenStore for StaticToken {
    type Error = Infallible;

    async fn load_token(&self) -> Result<Option<String>, Self::Error> {
        Ok(self.token.clone())
    }

    async fn save_token(&self, _token: &str) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn clear_token(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
