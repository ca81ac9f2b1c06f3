//! Local pointer-file cache under `~/.skein/`, recording which
//! applications this client has submitted so `getApplications`/`status`
//! can find them again without re-querying the ResourceManager for every
//! application that ever existed.

// Layer 1: Standard library imports
use std::path::{Path, PathBuf};

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

// Layer 3: Internal module imports
use crate::error::{ClientError, Result};
use skein_core::ApplicationId;

/// One submitted application's cached bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerEntry {
    pub id: ApplicationId,
    pub name: String,
    pub submitted_at: DateTime<Utc>,
}

/// Reads and writes `PointerEntry` JSON files under a base directory,
/// one file per application id.
pub struct PointerStore {
    dir: PathBuf,
}

impl PointerStore {
    /// Use `~/.skein/apps` as the cache directory, falling back to `.skein/apps`
    /// under the current directory when the home directory cannot be
    /// resolved.
    pub fn default_location() -> Self {
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(".skein").join("apps"))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: ApplicationId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub async fn save(&self, entry: &PointerEntry) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_vec_pretty(entry)?;
        fs::write(self.path_for(entry.id), content).await?;
        Ok(())
    }

    pub async fn load(&self, id: ApplicationId) -> Result<PointerEntry> {
        let path = self.path_for(id);
        let content = fs::read(&path)
            .await
            .map_err(|_| ClientError::UnknownApplication(id.to_string()))?;
        Ok(serde_json::from_slice(&content)?)
    }

    pub async fn list(&self) -> Result<Vec<PointerEntry>> {
        let mut entries = Vec::new();
        let mut read_dir = match fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(err) => return Err(err.into()),
        };
        while let Some(dir_entry) = read_dir.next_entry().await? {
            if dir_entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read(dir_entry.path()).await?;
            entries.push(serde_json::from_slice(&content)?);
        }
        Ok(entries)
    }

    pub async fn remove(&self, id: ApplicationId) -> Result<()> {
        let path = self.path_for(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: ApplicationId) -> PointerEntry {
        PointerEntry {
            id,
            name: "demo".to_string(),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let temp = tempfile::tempdir().unwrap();
        let store = PointerStore::at(temp.path());
        let id = ApplicationId::new();
        store.save(&entry(id)).await.unwrap();

        let loaded = store.load(id).await.unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "demo");
    }

    #[tokio::test]
    async fn load_missing_is_unknown_application() {
        let temp = tempfile::tempdir().unwrap();
        let store = PointerStore::at(temp.path());
        let err = store.load(ApplicationId::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownApplication(_)));
    }

    #[tokio::test]
    async fn list_empty_directory_returns_empty() {
        let temp = tempfile::tempdir().unwrap();
        let store = PointerStore::at(temp.path().join("does-not-exist-yet"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_returns_every_saved_entry() {
        let temp = tempfile::tempdir().unwrap();
        let store = PointerStore::at(temp.path());
        let a = ApplicationId::new();
        let b = ApplicationId::new();
        store.save(&entry(a)).await.unwrap();
        store.save(&entry(b)).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let store = PointerStore::at(temp.path());
        let id = ApplicationId::new();
        store.save(&entry(id)).await.unwrap();
        store.remove(id).await.unwrap();
        store.remove(id).await.unwrap();
        assert!(store.load(id).await.is_err());
    }
}
