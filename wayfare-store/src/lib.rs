pub mod app_config;
pub mod file_store;
pub mod redis_store;

pub use file_store::FileStore;
pub use redis_store::RedisStore;

use app_config::{StorageBackend, StorageConfig};
use wayfare_core::{BlobStore, MemoryStore, StorageError};

/// Open the backend selected in config.
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn BlobStore>, StorageError> {
    let store: Box<dyn BlobStore> = match config.backend {
        StorageBackend::File => Box::new(FileStore::new(&config.path)),
        StorageBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .ok_or_else(|| StorageError::Backend("storage.redis_url is required for redis".to_string()))?;
            Box::new(RedisStore::new(url, &config.key_prefix)?)
        }
        StorageBackend::Memory => Box::new(MemoryStore::new()),
    };
    tracing::info!("Using {:?} storage backend", config.backend);
    Ok(store)
}
