//! # Folio Model
//!
//! Persisted shape of a Folio book and the helpers around it:
//!
//! - [`BookState`]: canonical nested document, one per [`DocumentId`]
//! - [`BookPatch`]: field-level partial writes
//! - [`decode_document`]: versioned decoder folding legacy flat keys into the
//!   canonical shape at the store boundary

pub mod decode;
pub mod error;
pub mod id;
pub mod patch;
pub mod state;

pub use decode::decode_document;
pub use error::{ModelError, ModelResult};
pub use id::{generate_spread_id, DocumentId, IdResolution};
pub use patch::BookPatch;
pub use state::{
    BookState, DynamicSpreadDescriptor, EditableId, FieldId, PageFieldSet, PageSide,
    SpreadPages, ZoneId, ZonePosition, ZoneState,
};
