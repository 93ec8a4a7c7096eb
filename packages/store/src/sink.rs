use folio_model::BookPatch;
use std::sync::Mutex;

/// Destination for local edits. Implementations must not block the caller.
pub trait PatchSink: Send + Sync {
    fn send(&self, patch: BookPatch);
}

/// Keeps every patch in memory instead of persisting it
#[derive(Debug, Default)]
pub struct RecordingSink {
    patches: Mutex<Vec<BookPatch>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patches sent so far, oldest first
    pub fn patches(&self) -> Vec<BookPatch> {
        self.patches.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Remove and return everything recorded
    pub fn take(&self) -> Vec<BookPatch> {
        std::mem::take(&mut *self.patches.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl PatchSink for RecordingSink {
    fn send(&self, patch: BookPatch) {
        self.patches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(patch);
    }
}
