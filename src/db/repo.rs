use async_trait::async_trait;

use super::model::*;

/// String-keyed durable values, read and written wholesale.
#[async_trait]
pub trait KeyValueRepo: Send + Sync {
    async fn get_value(&self, key: &str) -> DbResult<Option<String>>;
    async fn put_value(&self, key: &str, value: &str) -> DbResult<()>;
}
