use tracing::{error, info};
use wayfare_core::{BlobStore, SyncError, SyncTransport};
use wayfare_shared::{AiConfig, WebDavConfig};

use crate::repository::{ImportOutcome, TripRepository};

/// Pushes and pulls the repository snapshot through a remote transport
pub struct SyncService<T: SyncTransport> {
    transport: T,
}

impl<T: SyncTransport> SyncService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Refuse to build a service for a disabled or incomplete remote.
    pub fn configured(config: &WebDavConfig, transport: T) -> Result<Self, SyncError> {
        if !config.is_usable() {
            return Err(SyncError::NotConfigured);
        }
        info!("Sync target {}", config.effective_url());
        Ok(Self::new(transport))
    }

    pub async fn upload<S: BlobStore>(
        &self,
        repo: &mut TripRepository<S>,
        ai_config: Option<AiConfig>,
    ) -> Result<(), SyncError> {
        let document = repo.export_document(ai_config);
        let count = document.trips.len();
        self.transport.upload(&document).await.map_err(|err| {
            error!("Upload failed: {}", err);
            err
        })?;
        info!("Uploaded {} trip(s)", count);
        Ok(())
    }

    /// Replace local trips with the remote snapshot.
    pub async fn download<S: BlobStore>(
        &self,
        repo: &mut TripRepository<S>,
    ) -> Result<ImportOutcome, SyncError> {
        let document = self.transport.download().await.map_err(|err| {
            error!("Download failed: {}", err);
            err
        })?;
        Ok(repo.import_document(document))
    }

    pub async fn test_connection(&self) -> Result<bool, SyncError> {
        self.transport.test_connection().await
    }

    pub async fn remote_exists(&self) -> Result<bool, SyncError> {
        self.transport.exists().await
    }
}
