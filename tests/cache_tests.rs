use linkboard::cache::{CacheStore, Theme, CACHE_VERSION};
use linkboard::catalog;
use linkboard::model::Site;
use tempfile::TempDir;

#[test]
fn cold_load_seeds_defaults_and_persists_them() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());

    let loaded = store.load();
    assert_eq!(loaded, catalog::default_categories());

    // The reseed is written back: version marker and snapshot exist now.
    let version = std::fs::read_to_string(dir.path().join("board-data.version")).unwrap();
    assert_eq!(version, CACHE_VERSION);
    assert!(dir.path().join("board-data.json").exists());
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());

    let mut categories = catalog::default_categories();
    let category_id = categories[0].id.clone();
    let sort_order = categories[0].sites.len() as i32;
    categories[0].sites.push(Site {
        id: "custom".into(),
        category_id,
        name: "Custom".into(),
        description: "added by hand".into(),
        url: "https://custom.example".into(),
        tags: vec!["mine".into()],
        shortcut: "-".into(),
        emoji: "🔗".into(),
        sort_order,
    });
    store.save(&categories);

    // A fresh store over the same directory sees the same content.
    let reloaded = CacheStore::new(dir.path()).load();
    assert_eq!(reloaded, categories);
}

#[test]
fn version_drift_is_treated_as_cache_miss() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());

    let mut categories = catalog::default_categories();
    categories.truncate(1);
    store.save(&categories);

    // Pretend the snapshot came from an older release.
    std::fs::write(dir.path().join("board-data.version"), "1").unwrap();

    let reloaded = CacheStore::new(dir.path()).load();
    assert_eq!(reloaded, catalog::default_categories());
}

#[test]
fn malformed_snapshot_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());
    store.save(&catalog::default_categories());

    std::fs::write(dir.path().join("board-data.json"), "{not json").unwrap();

    let reloaded = CacheStore::new(dir.path()).load();
    assert_eq!(reloaded, catalog::default_categories());
}

#[test]
fn clear_forces_a_reseed_on_next_load() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());

    let mut categories = catalog::default_categories();
    categories[0].sites.clear();
    store.save(&categories);
    store.clear();

    assert!(!dir.path().join("board-data.version").exists());
    assert_eq!(store.load(), catalog::default_categories());
}

#[test]
fn theme_round_trips_and_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(dir.path());

    assert_eq!(store.load_theme(), None);
    store.save_theme(Theme::Dark);
    assert_eq!(store.load_theme(), Some(Theme::Dark));
    store.save_theme(Theme::Light);
    assert_eq!(store.load_theme(), Some(Theme::Light));

    std::fs::write(dir.path().join("board-theme"), "sepia").unwrap();
    assert_eq!(store.load_theme(), None);
}
