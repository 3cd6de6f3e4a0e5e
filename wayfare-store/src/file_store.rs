use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use wayfare_core::{BlobStore, StorageError};

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Write-then-rename so a crash mid-save leaves the old blob intact.
    fn save(&mut self, key: &str, blob: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        let staging = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&staging, blob)?;
        fs::rename(&staging, &target)?;
        debug!("Saved {} bytes to {}", blob.len(), target.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::TRIPS_KEY;

    #[test]
    fn test_missing_key_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created"));
        assert!(store.load(TRIPS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        store.save(TRIPS_KEY, "[]").unwrap();
        store.save(TRIPS_KEY, "[1]").unwrap();

        assert_eq!(store.load(TRIPS_KEY).unwrap().as_deref(), Some("[1]"));
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("nested")).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
