use crate::backend::Channels;
use crate::error::StoreResult;
use folio_model::DocumentId;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Watches a `FileStore` directory and republishes documents written by
/// other processes to in-process subscribers. Watching stops on drop.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
    dir: PathBuf,
}

impl StoreWatcher {
    pub(crate) fn start(dir: PathBuf, channels: Arc<Channels>) -> StoreResult<Self> {
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => forward_event(&event, &channels),
                Err(err) => warn!(error = %err, "Store watcher error"),
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn forward_event(event: &Event, channels: &Channels) {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return;
    }

    for path in &event.paths {
        let Some(id) = document_id_for(path) else {
            continue;
        };
        if !channels.has_subscribers(&id) {
            continue;
        }

        let document = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

        match document {
            Ok(document) => {
                channels.publish(&id, document);
            }
            // Usually a half-observed write; the next event carries the document
            Err(err) => debug!(path = %path.display(), error = %err, "Skipping unreadable document"),
        }
    }
}

/// `<dir>/<id>.json` → `id`; temp files and other entries are ignored
pub(crate) fn document_id_for(path: &Path) -> Option<DocumentId> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() || stem.starts_with('.') {
        return None;
    }
    Some(DocumentId::new(stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_for() {
        assert_eq!(
            document_id_for(Path::new("/store/abc123.json")),
            Some(DocumentId::new("abc123"))
        );
        assert_eq!(document_id_for(Path::new("/store/abc123.json.tmp")), None);
        assert_eq!(document_id_for(Path::new("/store/.json")), None);
        assert_eq!(document_id_for(Path::new("/store/notes.txt")), None);
    }
}
