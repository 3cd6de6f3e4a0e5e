use async_trait::async_trait;
use std::sync::Mutex;
use wayfare_shared::SyncDocument;

use crate::SyncError;

/// Name of the snapshot file on the remote store.
pub const SYNC_FILE_NAME: &str = "simple-transport-sync.json";

/// Remote file store carrying the sync document
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn upload(&self, document: &SyncDocument) -> Result<(), SyncError>;

    async fn download(&self) -> Result<SyncDocument, SyncError>;

    async fn exists(&self) -> Result<bool, SyncError>;

    async fn test_connection(&self) -> Result<bool, SyncError>;
}

pub fn encode_document(document: &SyncDocument) -> Result<String, SyncError> {
    Ok(serde_json::to_string_pretty(document)?)
}

pub fn decode_document(content: &str) -> Result<SyncDocument, SyncError> {
    Ok(serde_json::from_str(content)?)
}

/// Transport holding the encoded document in memory
#[derive(Debug, Default)]
pub struct MemoryTransport {
    content: Mutex<Option<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with raw remote content, which need not be well formed.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Mutex::new(Some(content.into())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, SyncError> {
        self.content
            .lock()
            .map_err(|_| SyncError::Transport("transport state poisoned".to_string()))
    }
}

#[async_trait]
impl SyncTransport for MemoryTransport {
    async fn upload(&self, document: &SyncDocument) -> Result<(), SyncError> {
        let encoded = encode_document(document)?;
        *self.slot()? = Some(encoded);
        Ok(())
    }

    async fn download(&self) -> Result<SyncDocument, SyncError> {
        let slot = self.slot()?;
        let content = slot
            .as_deref()
            .ok_or_else(|| SyncError::Transport(format!("{} not found", SYNC_FILE_NAME)))?;
        decode_document(content)
    }

    async fn exists(&self) -> Result<bool, SyncError> {
        Ok(self.slot()?.is_some())
    }

    async fn test_connection(&self) -> Result<bool, SyncError> {
        Ok(true)
    }
}
