use folio_model::{BookPatch, DocumentId, ZonePosition};
use folio_store::{BookStore, DocumentStore, FileStore, MemoryStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_two_viewers_keep_each_others_fields() {
    let backend = Arc::new(MemoryStore::new());
    let a = BookStore::new(DocumentId::new("shared"), backend.clone());
    let b = BookStore::new(DocumentId::new("shared"), backend.clone());

    a.patch_now(&BookPatch::text("page-1a", "from a")).await.unwrap();
    b.patch_now(&BookPatch::text("page-1b", "from b")).await.unwrap();
    a.patch_now(&BookPatch::zone_hidden("img-1a", true)).await.unwrap();
    b.patch_now(&BookPatch::zone_position("img-1a", ZonePosition::Bottom))
        .await
        .unwrap();

    let state = a.load().await;
    assert_eq!(state.texts["page-1a"], "from a");
    assert_eq!(state.texts["page-1b"], "from b");
    assert_eq!(state.zones["img-1a"].hidden, Some(true));
    assert_eq!(state.zones["img-1a"].position, Some(ZonePosition::Bottom));
}

#[tokio::test]
async fn test_every_subscriber_sees_each_write() {
    let backend = Arc::new(MemoryStore::new());
    let writer = BookStore::new(DocumentId::new("book"), backend.clone());
    let viewer = BookStore::new(DocumentId::new("book"), backend.clone());

    let mut first = writer.subscribe();
    let mut second = viewer.subscribe();

    writer.patch_now(&BookPatch::current_spread(3)).await.unwrap();

    assert_eq!(first.next().await.unwrap().current_spread_index, 3);
    assert_eq!(second.next().await.unwrap().current_spread_index, 3);
}

#[tokio::test]
async fn test_patch_onto_legacy_document() {
    let backend = Arc::new(MemoryStore::new().with_document(
        "old",
        json!({ "texts.page-1a": "legacy", "currentSpread": 2 }),
    ));
    let store = BookStore::new(DocumentId::new("old"), backend.clone());

    store.patch_now(&BookPatch::text("page-2a", "new")).await.unwrap();

    let state = store.load().await;
    assert_eq!(state.texts["page-1a"], "legacy");
    assert_eq!(state.texts["page-2a"], "new");
    assert_eq!(state.current_spread_index, 2);
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let id = DocumentId::new("persisted");

    {
        let store = BookStore::new(id.clone(), Arc::new(FileStore::open(dir.path()).unwrap()));
        store
            .patch_now(&BookPatch::editable("title", "<b>Libro</b>"))
            .await
            .unwrap();
    }

    let backend = FileStore::open(dir.path()).unwrap();
    assert_eq!(backend.list().unwrap(), vec![id.clone()]);

    let raw = backend.get(&id).await.unwrap().unwrap();
    assert_eq!(raw["editables"]["title"], "<b>Libro</b>");
}

#[tokio::test]
async fn test_file_watcher_reports_external_writes() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileStore::open(dir.path()).unwrap());
    let _watcher = backend.watch().unwrap();
    let store = BookStore::new(DocumentId::new("watched"), backend.clone());
    let mut updates = store.subscribe();

    // Another process rewrites the document
    std::fs::write(
        dir.path().join("watched.json"),
        r#"{ "texts": { "page-3b": "externo" } }"#,
    )
    .unwrap();

    let snapshot = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match updates.next().await {
                Some(state) if state.texts.contains_key("page-3b") => return Some(state),
                Some(_) => continue,
                None => return None,
            }
        }
    })
    .await
    .expect("no update from watcher")
    .expect("store closed");

    assert_eq!(snapshot.texts["page-3b"], "externo");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_queued_keystroke_wins_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FileStore::open(dir.path()).unwrap());
    let store = BookStore::new(DocumentId::new("typing"), backend);
    let mut updates = store.subscribe();

    for i in 0..50 {
        store.patch(BookPatch::text("page-1a", i.to_string()));
    }

    loop {
        let snapshot = tokio::time::timeout(Duration::from_secs(5), updates.next())
            .await
            .expect("timed out waiting for writes")
            .expect("store closed");
        if snapshot.texts.get("page-1a").map(String::as_str) == Some("49") {
            break;
        }
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.load().await.texts["page-1a"], "49");
}
