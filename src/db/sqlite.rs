use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
    value_cache: RwLock<HashMap<String, String>>,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        // Every connection to an in-memory database sees its own empty
        // database, so it gets exactly one connection that is never reaped.
        let pool_options = if db_path.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;

        let repo = Self {
            pool,
            value_cache: RwLock::new(HashMap::new()),
        };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn get_entry(&self, key: &str) -> DbResult<KeyValue> {
        let result = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT name, value, updated FROM keyvalue WHERE name = ?",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound(format!("Key not found: {}", key)),
            _ => DbError::Sqlx(e),
        })?;

        Ok(KeyValue {
            key: result.0,
            value: result.1,
            updated: result.2.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        })
    }
}

#[async_trait]
impl KeyValueRepo for SqliteRepository {
    async fn get_value(&self, key: &str) -> DbResult<Option<String>> {
        {
            let cache = self.value_cache.read().await;
            if let Some(value) = cache.get(key) {
                return Ok(Some(value.clone()));
            }
        }

        let value = match self.get_entry(key).await {
            Ok(entry) => entry.value,
            Err(DbError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut cache = self.value_cache.write().await;
        cache.insert(key.to_string(), value.clone());

        Ok(Some(value))
    }

    async fn put_value(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query("INSERT OR REPLACE INTO keyvalue (name, value, updated) VALUES (?, ?, ?)")
            .bind(key)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        let mut cache = self.value_cache.write().await;
        cache.insert(key.to_string(), value.to_string());
        debug!(key = %key, bytes = value.len(), "Stored value");
        Ok(())
    }
}
