//! Durable key-value state.
//!
//! The pipeline's memory that must survive a restart lives here: the
//! notified-event ledger and the user's alert preferences, each stored as a
//! JSON blob under a fixed key in the `app_state` table. Consumers depend on
//! the [`StateStore`] trait, not the SQLite implementation.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::models::AlertPolicy;

// ---

/// Key holding the notified-event id list, oldest first.
pub const LEDGER_KEY: &str = "notified_events";

/// Key holding the persisted [`AlertPolicy`].
pub const PREFERENCES_KEY: &str = "alert_preferences";

/// Durable storage for state the pipeline reloads on startup.
///
/// `None` results mean the key has never been written; decode failures
/// surface as [`StoreError::Corrupt`] so the caller can choose to start
/// fresh instead of crashing.
#[async_trait]
pub trait StateStore: Send + Sync {
    // ---
    async fn load_ledger_ids(&self) -> Result<Option<Vec<String>>, StoreError>;
    async fn save_ledger_ids(&self, ids: &[String]) -> Result<(), StoreError>;
    async fn load_policy(&self) -> Result<Option<AlertPolicy>, StoreError>;
    async fn save_policy(&self, policy: &AlertPolicy) -> Result<(), StoreError>;
}

// ---

/// [`StateStore`] backed by the `app_state` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn read_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        // ---
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn write_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO app_state (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT (key) DO UPDATE SET
                value      = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    // ---
    async fn load_ledger_ids(&self) -> Result<Option<Vec<String>>, StoreError> {
        // ---
        let Some(raw) = self.read_value(LEDGER_KEY).await? else {
            return Ok(None);
        };
        let ids = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: LEDGER_KEY,
            source,
        })?;
        Ok(Some(ids))
    }

    async fn save_ledger_ids(&self, ids: &[String]) -> Result<(), StoreError> {
        // ---
        let raw = serde_json::to_string(ids).map_err(|source| StoreError::Encode {
            key: LEDGER_KEY,
            source,
        })?;
        self.write_value(LEDGER_KEY, &raw).await
    }

    async fn load_policy(&self) -> Result<Option<AlertPolicy>, StoreError> {
        // ---
        let Some(raw) = self.read_value(PREFERENCES_KEY).await? else {
            return Ok(None);
        };
        let policy = serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: PREFERENCES_KEY,
            source,
        })?;
        Ok(Some(policy))
    }

    async fn save_policy(&self, policy: &AlertPolicy) -> Result<(), StoreError> {
        // ---
        let raw = serde_json::to_string(policy).map_err(|source| StoreError::Encode {
            key: PREFERENCES_KEY,
            source,
        })?;
        self.write_value(PREFERENCES_KEY, &raw).await
    }
}
