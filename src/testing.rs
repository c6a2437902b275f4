use std::fs;
#[cfg(test)]
use std::sync::Once;
use tempfile::TempDir;

#[cfg(test)]
static INIT: Once = Once::new();

#[cfg(test)]
pub fn init() -> TempDir {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")))
            .with_test_writer()
            .try_init();
    });
    TempDir::new().expect("failed to create temp dir")
}

// Creates a test config rooted in a temp dir, with the config directory pre-created.
#[cfg(test)]
pub fn config() -> (crate::config::Config, TempDir) {
    let temp_dir = init();
    let config_dir = temp_dir.path().join("config");
    fs::create_dir_all(&config_dir).expect("failed to create config dir");
    let config = crate::config::Config { config_dir };
    (config, temp_dir)
}

// Creates a cache seeded with fake records keyed by paths that do not exist on disk. The
// selector never touches the filesystem for paths that are already cached, so these are
// enough to exercise filtering and sampling.
#[cfg(test)]
pub fn seeded_cache() -> (crate::config::Config, crate::cache::TagCache, TempDir) {
    use crate::audiotags::TagRecord;

    let (config, temp_dir) = config();
    let mut cache = crate::cache::TagCache::load(&config.tags_cache_path());

    let records = [
        ("/music/a1.mp3", "Airbag", "Radiohead", "OK Computer", "Rock", Some(2001), Some(200)),
        ("/music/a2.mp3", "Karma Police", "Radiohead", "OK Computer", "Rock", Some(2002), Some(250)),
        ("/music/a3.mp3", "Reckoner", "Radiohead", "In Rainbows", "Rock;Indie", Some(2003), Some(300)),
        ("/music/b1.mp3", "So What", "Miles Davis", "Kind of Blue", "Jazz", Some(1995), Some(180)),
        ("/music/b2.flac", "Blue in Green", "Miles Davis", "Kind of Blue", "Jazz/Fusion", None, Some(220)),
        ("/music/c1.flac", "Aerodynamic", "Daft Punk", "Discovery", "Electronic", Some(2010), Some(240)),
    ];
    for (path, title, artist, album, genre, year, duration) in records {
        cache.insert(
            path.to_string(),
            TagRecord {
                title: Some(title.to_string()),
                artist: Some(artist.to_string()),
                album: Some(album.to_string()),
                genre: Some(genre.to_string()),
                genres: crate::audiotags::split_genre_tag(Some(genre)),
                year,
                duration_sec: duration,
                lyrics: None,
            },
        );
    }

    (config, cache, temp_dir)
}

#[cfg(test)]
pub fn seeded_paths() -> Vec<std::path::PathBuf> {
    ["/music/a1.mp3", "/music/a2.mp3", "/music/a3.mp3", "/music/b1.mp3", "/music/b2.flac", "/music/c1.flac"]
        .iter()
        .map(std::path::PathBuf::from)
        .collect()
}
