//! Document and spread identifiers.
//!
//! A `DocumentId` is the sole addressing key into the store. It travels as
//! the `id` query parameter of the hosting page; when the parameter is
//! missing a new id is generated and the hosting layer redirects to it.

use percent_encoding::percent_decode_str;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const DOCUMENT_ID_LEN: usize = 7;

/// Opaque identifier of one book document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random base-36 id
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let id = (0..DOCUMENT_ID_LEN)
            .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Read the `id` parameter from a query string (`?id=abc&x=1` or `id=abc`).
    ///
    /// The value is form-decoded: `+` is a space and `%XX` escapes are
    /// resolved. Values that do not decode to UTF-8 are ignored.
    pub fn from_query(query: &str) -> Option<Self> {
        let (_, raw) = query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "id")?;

        let plus_decoded = raw.replace('+', " ");
        let value = match percent_decode_str(&plus_decoded).decode_utf8() {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "Ignoring undecodable id parameter");
                return None;
            }
        };

        let value = value.trim();
        (!value.is_empty()).then(|| Self::new(value))
    }

    /// Resolve the document id for a page load
    pub fn resolve(query: &str) -> IdResolution {
        match Self::from_query(query) {
            Some(id) => IdResolution::Existing(id),
            None => {
                let id = Self::generate();
                let redirect_query = format!("?id={}", id);
                IdResolution::Generated { id, redirect_query }
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Outcome of resolving the document id of a page load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdResolution {
    /// The query named a document
    Existing(DocumentId),

    /// No id was given; the host should navigate to `redirect_query`
    Generated {
        id: DocumentId,
        redirect_query: String,
    },
}

impl IdResolution {
    pub fn id(&self) -> &DocumentId {
        match self {
            IdResolution::Existing(id) => id,
            IdResolution::Generated { id, .. } => id,
        }
    }

    pub fn redirect(&self) -> Option<&str> {
        match self {
            IdResolution::Existing(_) => None,
            IdResolution::Generated { redirect_query, .. } => Some(redirect_query),
        }
    }
}

/// New dynamic spread id: `dyn-<unix millis>-<random 0..10000>`.
///
/// Unique within a session; ids are scoped to one document so no
/// cross-session guarantee is needed.
pub fn generate_spread_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..10_000);
    format!("dyn-{}-{}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_document_id_shape() {
        let id = DocumentId::generate();
        assert_eq!(id.as_str().len(), DOCUMENT_ID_LEN);
        assert!(id.as_str().bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_from_query() {
        assert_eq!(DocumentId::from_query("?id=k3x9a1b"), Some(DocumentId::new("k3x9a1b")));
        assert_eq!(DocumentId::from_query("lang=es&id=abc"), Some(DocumentId::new("abc")));
        assert_eq!(DocumentId::from_query("?id="), None);
        assert_eq!(DocumentId::from_query(""), None);
    }

    #[test]
    fn test_from_query_decodes_escapes() {
        assert_eq!(DocumentId::from_query("?id=a%2Db"), Some(DocumentId::new("a-b")));
        assert_eq!(DocumentId::from_query("?id=mi+libro"), Some(DocumentId::new("mi libro")));
        assert_eq!(DocumentId::from_query("?id=%20"), None);
        assert_eq!(DocumentId::from_query("?id=%FF"), None);
    }

    #[test]
    fn test_resolve_generates_redirect_when_missing() {
        let resolution = DocumentId::resolve("?lang=es");
        let redirect = resolution.redirect().unwrap().to_string();
        assert_eq!(redirect, format!("?id={}", resolution.id()));

        let existing = DocumentId::resolve("?id=abc");
        assert_eq!(existing, IdResolution::Existing(DocumentId::new("abc")));
        assert!(existing.redirect().is_none());
    }

    #[test]
    fn test_spread_ids_have_prefix() {
        let id = generate_spread_id();
        assert!(id.starts_with("dyn-"));
        assert_eq!(id.matches('-').count(), 2);
    }
}
