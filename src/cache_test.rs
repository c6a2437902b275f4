use crate::audiotags::TagRecord;
use crate::cache::TagCache;
use crate::testing;
use std::fs;
use std::path::Path;

#[test]
fn test_load_missing_store() {
    let (config, _tmp) = testing::config();
    let cache = TagCache::load(&config.tags_cache_path());
    assert!(cache.is_empty());
    assert!(!cache.is_dirty());
}

#[test]
fn test_load_corrupt_store() {
    let (config, _tmp) = testing::config();
    fs::write(config.tags_cache_path(), "{not json at all").unwrap();
    let cache = TagCache::load(&config.tags_cache_path());
    assert!(cache.is_empty());
}

#[test]
fn test_get_or_extract_memoizes_failures() {
    let (config, _tmp) = testing::config();
    let mut cache = TagCache::load(&config.tags_cache_path());

    // A nonexistent file extracts as the empty record, and the miss is cached.
    let record = cache.get_or_extract(Path::new("/nowhere/song.mp3"));
    assert_eq!(record, TagRecord::default());
    assert_eq!(cache.len(), 1);
    assert!(cache.is_dirty());

    let again = cache.get_or_extract(Path::new("/nowhere/song.mp3"));
    assert_eq!(again, record);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_save_roundtrip() {
    let (config, _tmp) = testing::config();
    let mut cache = TagCache::load(&config.tags_cache_path());
    cache.insert(
        "/music/a.mp3".to_string(),
        TagRecord {
            title: Some("A".to_string()),
            artist: Some("Artist".to_string()),
            genre: Some("Rock/Indie".to_string()),
            genres: vec!["Rock".to_string(), "Indie".to_string()],
            year: Some(2001),
            ..Default::default()
        },
    );
    cache.save();
    assert!(!cache.is_dirty());

    let reloaded = TagCache::load(&config.tags_cache_path());
    assert_eq!(reloaded.len(), 1);
    let record = reloaded.get(Path::new("/music/a.mp3")).unwrap();
    assert_eq!(record.title.as_deref(), Some("A"));
    assert_eq!(record.genres, vec!["Rock".to_string(), "Indie".to_string()]);
    assert_eq!(record.year, Some(2001));
}

#[test]
fn test_save_skipped_when_clean() {
    let (config, _tmp) = testing::config();
    let mut cache = TagCache::load(&config.tags_cache_path());
    cache.save();
    // Nothing changed, so nothing was written.
    assert!(!config.tags_cache_path().exists());
}

#[test]
fn test_clear_persists_empty_mapping() {
    let (config, _tmp) = testing::config();
    let mut cache = TagCache::load(&config.tags_cache_path());
    cache.insert("/music/a.mp3".to_string(), TagRecord::default());
    cache.save();

    cache.clear();
    assert!(cache.is_empty());

    let reloaded = TagCache::load(&config.tags_cache_path());
    assert!(reloaded.is_empty());
}

#[test]
fn test_migrate_recomputes_genres() {
    let (config, _tmp) = testing::config();
    let mut cache = TagCache::load(&config.tags_cache_path());
    // A record cached under an older splitting rule: the raw string survived but the list
    // was derived differently.
    cache.insert(
        "/music/a.mp3".to_string(),
        TagRecord {
            genre: Some("Rock/Alt-Rock; Indie".to_string()),
            genres: vec!["Rock/Alt-Rock; Indie".to_string()],
            ..Default::default()
        },
    );
    cache.save();

    cache.migrate();
    let record = cache.get(Path::new("/music/a.mp3")).unwrap();
    assert_eq!(record.genres, vec!["Rock", "Alt", "Rock", "Indie"]);

    // The migration persisted its work.
    let reloaded = TagCache::load(&config.tags_cache_path());
    assert_eq!(reloaded.get(Path::new("/music/a.mp3")).unwrap().genres, vec!["Rock", "Alt", "Rock", "Indie"]);
}

#[test]
fn test_migrate_is_idempotent() {
    let (config, _tmp) = testing::config();
    let mut cache = TagCache::load(&config.tags_cache_path());
    cache.insert(
        "/music/a.mp3".to_string(),
        TagRecord {
            genre: Some("Jazz;Fusion".to_string()),
            genres: vec!["Jazz".to_string(), "Fusion".to_string()],
            ..Default::default()
        },
    );
    cache.save();
    assert!(!cache.is_dirty());

    // Already canonical: migrating changes nothing and marks nothing dirty.
    cache.migrate();
    assert!(!cache.is_dirty());
    assert_eq!(cache.get(Path::new("/music/a.mp3")).unwrap().genres, vec!["Jazz", "Fusion"]);
}

#[test]
fn test_genre_vocabulary_sorted_unique() {
    let (_config, cache, _tmp) = testing::seeded_cache();
    let vocab = cache.genre_vocabulary();
    assert_eq!(vocab, vec!["Electronic", "Fusion", "Indie", "Jazz", "Rock"]);
}

#[test]
fn test_partial_store_corruption() {
    let (config, _tmp) = testing::config();
    // One malformed record does not poison the others.
    fs::write(
        config.tags_cache_path(),
        r#"{"/music/good.mp3": {"title": "Good"}, "/music/bad.mp3": {"title": 42}}"#,
    )
    .unwrap();
    let cache = TagCache::load(&config.tags_cache_path());
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(Path::new("/music/good.mp3")).unwrap().title.as_deref(), Some("Good"));
    assert_eq!(cache.get(Path::new("/music/bad.mp3")).unwrap(), &TagRecord::default());
}
