pub mod book;
pub mod edit;
pub mod id;
pub mod pages;
pub mod watch;

pub use book::{show, ShowArgs};
pub use edit::{edit, EditCommand};
pub use id::{new_id, resolve, ResolveArgs};
pub use pages::{add_page, goto, remove_page, turn, AddPageArgs, GotoArgs, RemovePageArgs, TurnArgs};
pub use watch::{watch, WatchArgs};

use crate::config::Config;
use anyhow::Result;
use clap::Args;
use folio_editor::{BookLayout, BookSession};
use folio_model::{BookPatch, DocumentId};
use folio_store::{BookStore, FileStore, RecordingSink};
use std::sync::Arc;
use tracing::debug;

/// Book addressed by a command
#[derive(Debug, Args)]
pub struct BookArg {
    /// Book id
    #[arg(long)]
    pub id: String,
}

/// Store, layout and config resolved for one invocation
pub struct Workspace {
    pub config: Config,
    pub layout: BookLayout,
    pub backend: Arc<FileStore>,
}

impl Workspace {
    pub fn open(cwd: &str, config: Config) -> Result<Self> {
        let layout = config.load_layout(cwd)?;
        let backend = Arc::new(FileStore::open(config.get_store_dir(cwd))?);
        Ok(Self {
            config,
            layout,
            backend,
        })
    }

    pub fn store(&self, id: &str) -> BookStore {
        BookStore::new(DocumentId::new(id), self.backend.clone())
    }

    /// Open a session whose patches are collected instead of sent, so the
    /// command can write them before exiting
    pub async fn session(&self, store: &BookStore) -> (BookSession, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let snapshot = store.load().await;
        let session = BookSession::from_snapshot(
            self.layout.clone(),
            snapshot,
            sink.clone(),
            self.config.mobile,
        );
        (session, sink)
    }
}

/// Write every collected patch as one merge-write. Returns the number of
/// patches folded.
pub async fn flush(store: &BookStore, sink: &RecordingSink) -> Result<usize> {
    let patches = sink.take();
    let count = patches.len();
    let mut combined = BookPatch::default();
    for patch in patches {
        combined.extend(patch);
    }
    if !combined.is_empty() {
        store.patch_now(&combined).await?;
    }
    debug!(document = %store.id(), patches = count, "Flushed patches");
    Ok(count)
}
