//! # Folio Editor
//!
//! Live, editable projection of a Folio book.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ store: BookStore::load() → BookState        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: BookSession                         │
//! │  - Reconciler: dynamic spreads → arena      │
//! │  - Projector: field values → projection     │
//! │  - MergeFilter: remote snapshots, per field │
//! │  - EditLeases: fields being typed into      │
//! │  - Navigator: current spread / page half    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ sink: BookPatch per local edit              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Store is source of truth**: the projection can always be rebuilt
//! 2. **Field-level writes**: every edit persists one field, last write wins
//! 3. **Local focus wins**: remote values never overwrite a leased field
//!
//! ## Usage
//!
//! ```rust,ignore
//! use folio_editor::{BookLayout, BookSession, Direction};
//! use folio_model::DocumentId;
//! use folio_store::{BookStore, MemoryStore};
//! use std::sync::Arc;
//!
//! let store = BookStore::new(DocumentId::new("abc1234"), Arc::new(MemoryStore::new()));
//! let mut session = BookSession::open(&store, BookLayout::standard(), false).await;
//!
//! session.edit_text("page-1a", "Había una vez…")?;
//! session.turn_page(Direction::Next);
//!
//! let mut updates = store.subscribe();
//! while let Some(snapshot) = updates.next().await {
//!     session.apply_remote(snapshot);
//! }
//! ```

pub mod edits;
pub mod errors;
pub mod layout;
pub mod lease;
pub mod merge;
pub mod navigation;
pub mod projection;
pub mod projector;
pub mod reconciler;
pub mod session;

pub use edits::Edit;
pub use errors::EditorError;
pub use layout::{BookLayout, PageSlots, SpreadTemplate, StaticSpread, TemplateSlot};
pub use lease::EditLeases;
pub use merge::{MergeFilter, MergeReport};
pub use navigation::{Direction, NavChange, Navigator};
pub use projection::{
    ImageField, Page, Projection, Region, Spread, SpreadKey, SpreadKind, TextField, Zone,
};
pub use projector::{ProjectionScope, Projector};
pub use reconciler::Reconciler;
pub use session::BookSession;
