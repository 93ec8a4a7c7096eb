//! # Folio Store
//!
//! Remote store adapter for Folio books.
//!
//! ```text
//! DocumentStore (get / merge_patch / subscribe, raw JSON)
//!   ├── MemoryStore   in-process map + broadcast channels
//!   └── FileStore     <dir>/<id>.json, optional notify watcher
//!            ↓
//! BookStore (one DocumentId, canonical BookState in and out)
//!   load() → BookState          never fails
//!   patch(BookPatch)            fire-and-forget
//!   subscribe() → Subscription  full snapshot per write
//! ```

mod adapter;
mod backend;
mod error;
mod file;
mod memory;
mod merge;
mod sink;
mod watcher;

pub use adapter::{BookStore, Subscription, Unsubscribe};
pub use backend::{Channels, DocumentStore, SUBSCRIPTION_CAPACITY};
pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use merge::merge_patch;
pub use sink::{PatchSink, RecordingSink};
pub use watcher::StoreWatcher;
