pub mod recognition;
pub mod storage;
pub mod sync;

pub use recognition::{parse_tickets, RecognizedTicket};
pub use storage::{BlobStore, MemoryStore, TRAVELERS_KEY, TRIPS_KEY};
pub use sync::{MemoryTransport, SyncTransport};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote sync is not configured or disabled")]
    NotConfigured,
    #[error("Sync transport failed: {0}")]
    Transport(String),
    #[error("Sync document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("Recognition payload is not valid ticket JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

pub type CoreResult<T> = Result<T, CoreError>;
