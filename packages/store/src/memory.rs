use crate::backend::{Channels, DocumentStore};
use crate::error::{StoreError, StoreResult};
use crate::merge::merge_patch;
use async_trait::async_trait;
use folio_model::DocumentId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// In-process document store (tests, demos, single-process sharing)
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<DocumentId, Value>>,
    channels: Channels,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw document, e.g. one written by an older client
    pub fn with_document(self, id: impl Into<DocumentId>, document: Value) -> Self {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.into(), document);
        self
    }

    /// Raw stored document, bypassing decoding
    pub fn raw(&self, id: &DocumentId) -> Option<Value> {
        self.documents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, id: &DocumentId) -> StoreResult<Option<Value>> {
        let documents = self
            .documents
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(documents.get(id).cloned())
    }

    async fn merge_patch(&self, id: &DocumentId, patch: &Value) -> StoreResult<()> {
        let updated = {
            let mut documents = self
                .documents
                .lock()
                .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
            let document = documents
                .entry(id.clone())
                .or_insert_with(|| Value::Object(Default::default()));
            merge_patch(document, patch)?;
            document.clone()
        };

        self.channels.publish(id, updated);
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

    #[tokio::test]
    async fn test_unknown_document_is_none() {
        let store = MemoryStore::new();
        let doc = store.get(&DocumentId::new("missing")).await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_patch_creates_and_merges() {
        let store = MemoryStore::new();
        let id = DocumentId::new("book");

        store.merge_patch(&id, &json!({ "texts": { "a": "1" } })).await.unwrap();
        store.merge_patch(&id, &json!({ "texts": { "b": "2" } })).await.unwrap();

        let doc = store.get(&id).await.unwrap().unwrap();
        assert_eq!(doc["texts"], json!({ "a": "1", "b": "2" }));
    }

    #[tokio::test]
    async fn test_subscribers_receive_full_document() {
        let store = MemoryStore::new().with_document("book", json!({ "currentSpread": 2 }));
        let id = DocumentId::new("book");
        let mut rx = store.subscribe(&id);

        store.merge_patch(&id, &json!({ "mobilePageSide": "right" })).await.unwrap();

        let doc = rx.recv().await.unwrap();
        assert_eq!(doc, json!({ "currentSpread": 2, "mobilePageSide": "right" }));
    }
}
