use folio_model::FieldId;
use std::collections::HashSet;
use tracing::debug;

/// Fields the local user is currently typing into.
///
/// The input layer takes a lease on focus and releases it on blur or commit.
/// While a lease is held, remote values for that field are not applied.
#[derive(Debug, Clone, Default)]
pub struct EditLeases {
    held: HashSet<FieldId>,
}

impl EditLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the field was already leased
    pub fn begin(&mut self, id: impl Into<FieldId>) -> bool {
        let id = id.into();
        debug!(field = %id, "Edit lease taken");
        self.held.insert(id)
    }

    /// Returns false if no lease was held
    pub fn end(&mut self, id: &str) -> bool {
        let released = self.held.remove(id);
        if released {
            debug!(field = id, "Edit lease released");
        }
        released
    }

    pub fn is_leased(&self, id: &str) -> bool {
        self.held.contains(id)
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
