use crate::backend::{Channels, DocumentStore};
use crate::error::{StoreError, StoreResult};
use crate::merge::merge_patch;
use crate::watcher::StoreWatcher;
use async_trait::async_trait;
use folio_model::DocumentId;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

/// Directory-backed store: one `<id>.json` document per book.
///
/// Writes are read-merge-write under a lock and land via rename, so readers
/// never observe a partial document.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    channels: Arc<Channels>,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (and create if needed) a store directory
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            channels: Arc::new(Channels::new()),
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Also deliver writes made by other processes to this store's subscribers.
    ///
    /// Own writes then reach subscribers twice (once directly, once via the
    /// watcher); subscribers already tolerate repeated documents.
    pub fn watch(&self) -> StoreResult<StoreWatcher> {
        StoreWatcher::start(self.dir.clone(), self.channels.clone())
    }

    /// Ids of every document in the store directory
    pub fn list(&self) -> StoreResult<Vec<DocumentId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            if let Some(id) = crate::watcher::document_id_for(&entry?.path()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn document_path(&self, id: &DocumentId) -> StoreResult<PathBuf> {
        let raw = id.as_str();
        let valid = !raw.is_empty()
            && !raw.starts_with('.')
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(raw.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", raw)))
    }

    async fn read_document(path: &Path) -> StoreResult<Option<Value>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, id: &DocumentId) -> StoreResult<Option<Value>> {
        let path = self.document_path(id)?;
        Self::read_document(&path).await
    }

    async fn merge_patch(&self, id: &DocumentId, patch: &Value) -> StoreResult<()> {
        let path = self.document_path(id)?;
        let _guard = self.write_lock.lock().await;

        let mut document = Self::read_document(&path)
            .await?
            .unwrap_or_else(|| Value::Object(Default::default()));
        merge_patch(&mut document, patch)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&document)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(document = %id, path = %path.display(), "Document written");

        self.channels.publish(id, document);
        Ok(())
    }

    fn subscribe(&self, id: &DocumentId) -> broadcast::Receiver<Value> {
        self.channels.subscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        let id = DocumentId::new("k3x9a1b");

        assert!(store.get(&id).await.unwrap().is_none());

        store.merge_patch(&id, &json!({ "texts": { "a": "1" } })).await.unwrap();
        store.merge_patch(&id, &json!({ "currentSpread": 3 })).await.unwrap();

        // A second handle on the same directory sees the merged document
        let reopened = FileStore::open(temp.path()).unwrap();
        let doc = reopened.get(&id).await.unwrap().unwrap();
        assert_eq!(doc, json!({ "texts": { "a": "1" }, "currentSpread": 3 }));
        assert_eq!(reopened.list().unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        let result = store.get(&DocumentId::new("../escape")).await;
        assert!(matches!(result, Err(StoreError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("bad.json"), "{ not json").unwrap();
        let store = FileStore::open(temp.path()).unwrap();

        let result = store.get(&DocumentId::new("bad")).await;
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
