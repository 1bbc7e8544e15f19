//! End-to-end tests for the overlay: merge precedence, handle semantics,
//! and lifecycle, driven through the public API the protocol layer uses.

use pseudofs_core::testing::MemoryStore;
use pseudofs_core::{
    FileAttributes, OverlayError, OverlayRegistry, PseudoEntry,
};
use std::sync::Arc;

fn shared_registry(store: Arc<MemoryStore>) -> Arc<OverlayRegistry> {
    OverlayRegistry::new(store).into_shared()
}

#[tokio::test]
async fn versions_folder_under_a_file() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/docs", "report.txt", 2048);
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register(
            "/docs/report.txt",
            PseudoEntry::folder("Versions", "/docs/report.txt/Versions").unwrap(),
        )
        .unwrap();
    registry
        .register(
            "/docs/report.txt/Versions",
            PseudoEntry::memory_file(
                "1.0.txt",
                "/docs/report.txt/Versions/1.0.txt",
                &b"first draft"[..],
            )
            .unwrap(),
        )
        .unwrap();
    registry
        .register(
            "/docs/report.txt/Versions",
            PseudoEntry::memory_file(
                "1.1.txt",
                "/docs/report.txt/Versions/1.1.txt",
                &b"second draft"[..],
            )
            .unwrap(),
        )
        .unwrap();

    // The file path acts as a parent carrying the synthetic folder.
    let listing = registry.list("/docs/report.txt").await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name(), "Versions");
    assert!(listing[0].is_folder());

    let folder = listing[0].pseudo().unwrap();
    let attrs = folder.descriptor().attributes();
    assert!(attrs.contains(FileAttributes::DIRECTORY | FileAttributes::READ_ONLY));
    assert_eq!(folder.descriptor().created(), folder.descriptor().modified());

    // Enumerate through the open folder handle.
    let handle = registry.open("/docs/report.txt/Versions").await.unwrap();
    assert!(handle.is_folder());
    let children = handle.list().await.unwrap();
    let names: Vec<&str> = children.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["1.0.txt", "1.1.txt"]);
    for child in &children {
        let entry = child.pseudo().unwrap();
        assert!(entry
            .descriptor()
            .attributes()
            .contains(FileAttributes::READ_ONLY));
    }

    // Folder handles read as empty and reject writes.
    assert!(handle.read(0, 4096).await.unwrap().is_empty());
    assert!(matches!(
        handle.write(0, b"x"),
        Err(OverlayError::NotSupported(_))
    ));

    // Version content is served through file handles, writes rejected.
    let v1 = registry
        .open("/docs/report.txt/Versions/1.0.txt")
        .await
        .unwrap();
    assert_eq!(v1.read(0, 64).await.unwrap(), "first draft");
    assert!(matches!(
        v1.write(0, b"x"),
        Err(OverlayError::NotSupported(_))
    ));
}

#[tokio::test]
async fn real_entries_shadow_pseudo_entries() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/projects", "notes.txt", 100);
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register(
            "/projects",
            PseudoEntry::memory_file("Notes.TXT", "/projects/Notes.TXT", &b"synthetic"[..])
                .unwrap(),
        )
        .unwrap();

    // Exactly one entry named notes.txt, and it is the real one.
    let listing = registry.list("/projects").await.unwrap();
    let matches: Vec<_> = listing
        .iter()
        .filter(|e| e.name().eq_ignore_ascii_case("notes.txt"))
        .collect();
    assert_eq!(matches.len(), 1);
    assert!(!matches[0].is_pseudo());
    assert_eq!(matches[0].size(), 100);

    // Lookup agrees with the listing.
    let found = registry.lookup("/projects", "Notes.TXT").await.unwrap();
    assert!(found.real().is_some());

    // Opening the shadowed pseudo entry is refused; the store owns it.
    assert!(matches!(
        registry.open("/projects/Notes.TXT").await,
        Err(OverlayError::NotSupported(_))
    ));
}

#[tokio::test]
async fn listing_order_is_stable_and_deterministic() {
    let store = Arc::new(MemoryStore::new());
    store.add_file("/data", "zulu.bin", 1);
    store.add_file("/data", "alpha.bin", 2);
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register(
            "/data",
            PseudoEntry::folder("Snapshots", "/data/Snapshots").unwrap(),
        )
        .unwrap();
    registry
        .register(
            "/data",
            PseudoEntry::memory_file("manifest", "/data/manifest", &b"{}"[..]).unwrap(),
        )
        .unwrap();

    // Real entries first in store order, then pseudo in registration order.
    let first = registry.list("/data").await.unwrap();
    let names: Vec<&str> = first.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["zulu.bin", "alpha.bin", "Snapshots", "manifest"]);

    let second = registry.list("/data").await.unwrap();
    let names_again: Vec<&str> = second.iter().map(|e| e.name()).collect();
    assert_eq!(names, names_again);
}

#[tokio::test]
async fn unregistered_entries_disappear() {
    let store = Arc::new(MemoryStore::new());
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register("/x", PseudoEntry::folder("gone", "/x/gone").unwrap())
        .unwrap();
    assert!(registry.lookup("/x", "gone").await.is_ok());

    registry.unregister("/x", "GONE").unwrap();
    assert!(registry.list("/x").await.unwrap().is_empty());
    assert!(matches!(
        registry.lookup("/x", "gone").await,
        Err(OverlayError::NotFound { .. })
    ));

    // Unregistering an absent name is a no-op.
    registry.unregister("/x", "gone").unwrap();
}

#[tokio::test]
async fn name_collisions_leave_the_set_untouched() {
    let store = Arc::new(MemoryStore::new());
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register("/x", PseudoEntry::folder("History", "/x/History").unwrap())
        .unwrap();
    let err = registry
        .register("/x", PseudoEntry::folder("history", "/x/history").unwrap())
        .unwrap_err();
    assert!(matches!(err, OverlayError::NameCollision { .. }));

    let listing = registry.list("/x").await.unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name(), "History");
}

#[tokio::test]
async fn eviction_tears_down_one_parent_only() {
    let store = Arc::new(MemoryStore::new());
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register("/a", PseudoEntry::folder("one", "/a/one").unwrap())
        .unwrap();
    registry
        .register("/b", PseudoEntry::folder("two", "/b/two").unwrap())
        .unwrap();

    assert!(registry.has_pseudo_entries("/a"));
    registry.evict("/a").unwrap();
    assert!(!registry.has_pseudo_entries("/a"));
    assert!(registry.has_pseudo_entries("/b"));

    registry.clear();
    assert!(!registry.has_pseudo_entries("/b"));
}

#[tokio::test]
async fn store_failures_surface_without_corrupting_state() {
    let store = Arc::new(MemoryStore::failing());
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register("/x", PseudoEntry::folder("kept", "/x/kept").unwrap())
        .unwrap();
    assert!(matches!(
        registry.list("/x").await,
        Err(OverlayError::Store(_))
    ));

    // The synthetic set survives the failed merge.
    assert!(registry.has_pseudo_entries("/x"));
}

#[tokio::test]
async fn ranged_reads_and_idempotent_close() {
    let store = Arc::new(MemoryStore::new());
    let registry = shared_registry(Arc::clone(&store));

    registry
        .register(
            "/f",
            PseudoEntry::memory_file("blob", "/f/blob", &b"0123456789"[..]).unwrap(),
        )
        .unwrap();

    let handle = registry.open("/f/blob").await.unwrap();
    assert_eq!(handle.read(0, 4).await.unwrap(), "0123");
    assert_eq!(handle.read(4, 100).await.unwrap(), "456789");
    assert!(handle.read(10, 4).await.unwrap().is_empty());
    assert!(handle.read(9999, 1).await.unwrap().is_empty());

    handle.close().await;
    assert!(handle.is_closed().await);
    // Closed handles read as end-of-file; closing again is safe.
    assert!(handle.read(0, 4).await.unwrap().is_empty());
    handle.close().await;
}

#[tokio::test]
async fn local_content_materializes_only_on_read() {
    use std::io::Write;

    let store = Arc::new(MemoryStore::new());
    let registry = shared_registry(Arc::clone(&store));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"snapshot payload").unwrap();
    let path = file.path().to_path_buf();

    registry
        .register(
            "/s",
            PseudoEntry::local_file("snap", "/s/snap", &path).unwrap(),
        )
        .unwrap();

    // Size came from the construction-time stat.
    let listing = registry.list("/s").await.unwrap();
    assert_eq!(listing[0].size(), 16);

    // Deleting the backing file after construction: listing and open
    // still work (no content touched), only read fails.
    drop(file);
    let listing = registry.list("/s").await.unwrap();
    assert_eq!(listing.len(), 1);
    let handle = registry.open("/s/snap").await.unwrap();
    assert!(matches!(
        handle.read(0, 16).await,
        Err(OverlayError::Store(_))
    ));
}

#[tokio::test]
async fn descriptor_ids_are_stable_across_instances() {
    let a = PseudoEntry::folder("Versions", "/docs/report.txt/Versions").unwrap();
    let b = PseudoEntry::folder("Versions", "/docs/report.txt/Versions").unwrap();
    assert_eq!(a.descriptor().file_id(), b.descriptor().file_id());
}

#[tokio::test]
async fn backslash_separator_registries_resolve_smb_style_paths() {
    use pseudofs_core::OverlayConfig;

    let store = Arc::new(MemoryStore::new());
    let registry = OverlayRegistry::with_config(
        store,
        &OverlayConfig {
            separator: '\\',
            case_insensitive: true,
        },
    )
    .into_shared();

    registry
        .register(
            "\\docs\\report.txt",
            PseudoEntry::folder("Versions", "\\docs\\report.txt\\Versions").unwrap(),
        )
        .unwrap();

    let found = registry
        .lookup_path("\\docs\\report.txt\\VERSIONS")
        .await
        .unwrap();
    assert_eq!(found.name(), "Versions");

    let handle = registry.open("\\docs\\report.txt\\Versions").await.unwrap();
    assert!(handle.is_folder());

    // Forward slashes are the foreign separator under this configuration.
    assert!(matches!(
        registry.list("\\docs/report.txt").await,
        Err(OverlayError::InvalidPath { .. })
    ));
}

#[tokio::test]
async fn open_unknown_path_reports_not_found() {
    let store = Arc::new(MemoryStore::new());
    let registry = shared_registry(Arc::clone(&store));

    assert!(matches!(
        registry.open("/nowhere/nothing").await,
        Err(OverlayError::NotFound { .. })
    ));
    assert!(matches!(
        registry.open("bad//path").await,
        Err(OverlayError::InvalidPath { .. })
    ));
}
