//! Storage substrate seam.
//!
//! The book core treats the store as an opaque key-value document store with
//! three operations. Backends deliver the full current document to
//! subscribers after every write (not a diff), at least once.

use crate::error::StoreResult;
use async_trait::async_trait;
use folio_model::DocumentId;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Buffered documents per subscriber before it starts lagging
pub const SUBSCRIPTION_CAPACITY: usize = 64;

/// Key-value document store addressed by `DocumentId`
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Raw stored document, `None` if the id has never been written
    async fn get(&self, id: &DocumentId) -> StoreResult<Option<Value>>;

    /// Merge-write `patch` into the stored document (see [`crate::merge_patch`])
    async fn merge_patch(&self, id: &DocumentId, patch: &Value) -> StoreResult<()>;

    /// Receive the full document after every write to `id`
    fn subscribe(&self, id: &DocumentId) -> broadcast::Receiver<Value>;
}

/// Per-document broadcast channels
#[derive(Debug, Default)]
pub struct Channels {
    senders: Mutex<HashMap<DocumentId, broadcast::Sender<Value>>>,
}

impl Channels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, id: &DocumentId) -> broadcast::Receiver<Value> {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders
            .entry(id.clone())
            .or_insert_with(|| broadcast::channel(SUBSCRIPTION_CAPACITY).0)
            .subscribe()
    }

    pub fn has_subscribers(&self, id: &DocumentId) -> bool {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders
            .get(id)
            .map(|sender| sender.receiver_count() > 0)
            .unwrap_or(false)
    }

    /// Deliver `document` to current subscribers of `id`; returns how many got it
    pub fn publish(&self, id: &DocumentId, document: Value) -> usize {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        match senders.get(id) {
            // Err only means nobody is listening right now
            Some(sender) => sender.send(document).unwrap_or(0),
            None => 0,
        }
    }
}
