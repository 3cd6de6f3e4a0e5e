use redis::Commands;
use tracing::debug;
use wayfare_core::{BlobStore, StorageError};

/// Blobs kept as plain string keys in Redis
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    key_prefix: String,
}

fn redis_error(err: redis::RedisError) -> StorageError {
    StorageError::Redis(err.to_string())
}

impl RedisStore {
    pub fn new(connection_string: &str, key_prefix: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(connection_string).map_err(redis_error)?;
        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

impl BlobStore for RedisStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.client.get_connection().map_err(redis_error)?;
        conn.get(self.key(key)).map_err(redis_error)
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<(), StorageError> {
        let mut conn = self.client.get_connection().map_err(redis_error)?;
        let key = self.key(key);
        conn.set::<_, _, ()>(&key, blob).map_err(redis_error)?;
        debug!("Saved {} bytes to redis key {}", blob.len(), key);
        Ok(())
    }
}
