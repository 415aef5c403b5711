use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::model::*;
use super::repo::*;

/// Key store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value.to_string());
        Self {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl KeyValueRepo for MemoryStore {
    async fn get_value(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put_value(&self, key: &str, value: &str) -> DbResult<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
