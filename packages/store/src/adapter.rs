//! # Book Store Adapter
//!
//! Binds a `DocumentStore` backend to one book and speaks canonical
//! `BookState` on every side: raw documents (in either the legacy flat-key or
//! the nested encoding) are decoded before they leave this module.
//!
//! Failure policy:
//! - `load` never fails; transport or decode errors yield the empty book
//! - `patch` is fire-and-forget; failures are logged and dropped. Patches
//!   from one `BookStore` (and its clones) reach the backend in send order
//! - subscriptions skip undecodable documents and survive lag

use crate::backend::DocumentStore;
use crate::error::StoreResult;
use crate::sink::PatchSink;
use folio_model::{decode_document, BookPatch, BookState, DocumentId};
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, instrument, warn};

/// Store handle for a single book
#[derive(Clone)]
pub struct BookStore {
    id: DocumentId,
    backend: Arc<dyn DocumentStore>,
    writer: Arc<OnceLock<mpsc::UnboundedSender<BookPatch>>>,
}

impl std::fmt::Debug for BookStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookStore").field("id", &self.id).finish()
    }
}

impl BookStore {
    pub fn new(id: DocumentId, backend: Arc<dyn DocumentStore>) -> Self {
        Self {
            id,
            backend,
            writer: Arc::new(OnceLock::new()),
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Current canonical state; the empty book on any failure
    #[instrument(skip(self), fields(document = %self.id))]
    pub async fn load(&self) -> BookState {
        match self.backend.get(&self.id).await {
            Ok(Some(raw)) => match decode_document(&raw) {
                Ok(state) => {
                    info!(
                        texts = state.texts.len(),
                        images = state.images.len(),
                        dynamic_spreads = state.dynamic_spreads.len(),
                        "Book loaded"
                    );
                    state
                }
                Err(err) => {
                    warn!(error = %err, "Stored book is unreadable, starting empty");
                    BookState::default()
                }
            },
            Ok(None) => {
                info!("New book, starting empty");
                BookState::default()
            }
            Err(err) => {
                warn!(error = %err, "Failed to load book, starting empty");
                BookState::default()
            }
        }
    }

    /// Merge-write `patch` and wait for the backend
    pub async fn patch_now(&self, patch: &BookPatch) -> StoreResult<()> {
        let value = patch.to_value()?;
        self.backend.merge_patch(&self.id, &value).await
    }

    /// Fire-and-forget merge-write. Never blocks, never reports failure.
    ///
    /// Queued patches are written one at a time by a single writer task, so a
    /// later patch to a field always lands after an earlier one.
    pub fn patch(&self, patch: BookPatch) {
        if patch.is_empty() {
            return;
        }

        let writer = match self.writer.get() {
            Some(writer) => writer,
            None => match Handle::try_current() {
                Ok(handle) => self.writer.get_or_init(|| self.spawn_writer(&handle)),
                Err(_) => {
                    warn!(document = %self.id, "No async runtime, dropping patch");
                    return;
                }
            },
        };

        if writer.send(patch).is_err() {
            warn!(document = %self.id, "Patch writer stopped, dropping patch");
        }
    }

    /// Drains queued patches in order until every handle to this store is gone
    fn spawn_writer(&self, handle: &Handle) -> mpsc::UnboundedSender<BookPatch> {
        let (tx, mut rx) = mpsc::unbounded_channel::<BookPatch>();
        let id = self.id.clone();
        let backend = self.backend.clone();

        handle.spawn(async move {
            while let Some(patch) = rx.recv().await {
                let written = match patch.to_value() {
                    Ok(value) => backend.merge_patch(&id, &value).await,
                    Err(err) => Err(err.into()),
                };
                if let Err(err) = written {
                    warn!(document = %id, error = %err, "Failed to save patch");
                }
            }
            debug!(document = %id, "Patch writer stopped");
        });

        tx
    }

    /// Stream of canonical snapshots, one per observed write (own writes included)
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            document: self.id.clone(),
            receiver: self.backend.subscribe(&self.id),
        }
    }

    /// Call `on_change` for every observed write until the handle is dropped
    pub fn subscribe_with<F>(&self, mut on_change: F) -> Unsubscribe
    where
        F: FnMut(BookState) + Send + 'static,
    {
        let mut subscription = self.subscribe();
        let task = tokio::spawn(async move {
            while let Some(state) = subscription.next().await {
                on_change(state);
            }
        });
        Unsubscribe { task }
    }
}

impl PatchSink for BookStore {
    fn send(&self, patch: BookPatch) {
        self.patch(patch);
    }
}

/// Receiving end of a book subscription
#[derive(Debug)]
pub struct Subscription {
    document: DocumentId,
    receiver: broadcast::Receiver<Value>,
}

impl Subscription {
    /// Next decoded snapshot; `None` once the store is gone
    pub async fn next(&mut self) -> Option<BookState> {
        loop {
            match self.receiver.recv().await {
                Ok(raw) => match decode_document(&raw) {
                    Ok(state) => return Some(state),
                    Err(err) => {
                        warn!(document = %self.document, error = %err, "Skipping unreadable snapshot");
                    }
                },
                // Every message is a full document, so dropping the backlog is safe
                Err(RecvError::Lagged(skipped)) => {
                    debug!(document = %self.document, skipped, "Subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Adapt into a `Stream` of snapshots, with the same skipping as `next`
    pub fn into_stream(self) -> impl Stream<Item = BookState> {
        let document = self.document;
        BroadcastStream::new(self.receiver).filter_map(move |item| match item {
            Ok(raw) => match decode_document(&raw) {
                Ok(state) => Some(state),
                Err(err) => {
                    warn!(document = %document, error = %err, "Skipping unreadable snapshot");
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                debug!(document = %document, skipped, "Subscriber lagged");
                None
            }
        })
    }
}

/// Handle for a callback subscription; the callback stops when dropped
#[derive(Debug)]
pub struct Unsubscribe {
    task: JoinHandle<()>,
}

impl Unsubscribe {
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.task.abort();
    }
}
