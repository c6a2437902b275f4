/// The library module ties the pieces together into one session object owning the config,
/// the selected folders, the scanned file list, the genre vocabulary, and the shared tag
/// cache. Interactive surfaces hold a `Library` instead of a pile of globals.
use crate::audiotags::TagRecord;
use crate::cache::TagCache;
use crate::common::uniq;
use crate::config::{load_selected_folders, save_selected_folders, Config};
use crate::errors::Result;
use crate::lyrics::{fetch_lyrics, normalize_lyrics};
use crate::playlist::{filter_files, pick_songs, pick_songs_by_duration, FilterCriteria};
use crate::scanner::{scan_library, spawn_scan, ScanHandle, ScanOutcome};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct Library {
    config: Config,
    folders: Vec<PathBuf>,
    files: Vec<PathBuf>,
    genres: BTreeSet<String>,
    cache: Arc<Mutex<TagCache>>,
}

impl Library {
    /// Open a library session: load the persisted folder list and tag cache, and bring old
    /// cached genre lists in line with the current splitting rule.
    pub fn open(config: Config) -> Library {
        let folders = load_selected_folders(&config);
        let mut cache = TagCache::load(&config.tags_cache_path());
        cache.migrate();
        let genres = cache.genre_vocabulary().into_iter().collect();
        Library {
            config,
            folders,
            files: vec![],
            genres,
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn genres(&self) -> Vec<String> {
        self.genres.iter().cloned().collect()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add folders to the selection and persist the new list. Duplicates are dropped.
    pub fn add_folders(&mut self, new: Vec<PathBuf>) -> Result<()> {
        let mut folders = self.folders.clone();
        folders.extend(new);
        self.folders = uniq(folders);
        save_selected_folders(&self.config, &self.folders)
    }

    /// Remove folders from the selection and persist the new list.
    pub fn remove_folders(&mut self, gone: &[PathBuf]) -> Result<()> {
        self.folders.retain(|f| !gone.contains(f));
        save_selected_folders(&self.config, &self.folders)
    }

    /// Drop the entire selection, the scanned state, and the tag cache. The empty cache is
    /// persisted immediately so the stale one cannot resurface on the next start.
    pub fn clear(&mut self) -> Result<()> {
        self.folders.clear();
        self.files.clear();
        self.genres.clear();
        self.cache.lock().unwrap().clear();
        info!("Cleared folder selection and tag cache");
        save_selected_folders(&self.config, &self.folders)
    }

    /// Scan the selected folders synchronously, replacing the file list and genre vocabulary.
    pub fn scan(&mut self) -> usize {
        let outcome = scan_library(&self.folders, &mut self.cache.lock().unwrap());
        self.apply_scan(outcome)
    }

    /// Start a background scan. At most one scan should run at a time; starting a new one
    /// while another runs is the caller's bug, so stop the old handle first.
    pub fn start_scan(&self) -> ScanHandle {
        spawn_scan(self.folders.clone(), Arc::clone(&self.cache))
    }

    /// Fold a finished (or cancelled) scan back into the session. A cancelled scan still
    /// yields the walked file list; the tags it got to are already cached.
    pub fn apply_scan(&mut self, outcome: ScanOutcome) -> usize {
        self.files = outcome.files;
        self.genres = outcome.genres;
        self.files.len()
    }

    pub fn tags(&self, path: &Path) -> TagRecord {
        self.cache.lock().unwrap().get_or_extract(path)
    }

    /// Build a random playlist of up to `n` files matching the criteria, persisting any tags
    /// extracted along the way.
    pub fn pick(&self, n: usize, criteria: &FilterCriteria) -> Vec<PathBuf> {
        let mut cache = self.cache.lock().unwrap();
        let playlist = pick_songs(&self.files, &mut cache, n, criteria);
        cache.save();
        playlist
    }

    /// Build a playlist targeting a cumulative duration in seconds.
    pub fn pick_by_duration(&self, target_sec: u64, criteria: &FilterCriteria) -> Vec<PathBuf> {
        let mut cache = self.cache.lock().unwrap();
        let playlist = pick_songs_by_duration(&self.files, &mut cache, target_sec, criteria);
        cache.save();
        playlist
    }

    /// How many files match the criteria, for the live count label next to the filters.
    pub fn song_count(&self, criteria: &FilterCriteria) -> usize {
        filter_files(&self.files, &mut self.cache.lock().unwrap(), criteria).len()
    }

    /// Lyrics for a file: embedded lyrics when present, otherwise a best-effort fetch from
    /// the lyrics service. Always returns displayable text, possibly empty.
    pub fn lyrics(&self, path: &Path) -> String {
        let record = self.tags(path);
        if let Some(embedded) = record.lyrics.as_deref().filter(|l| !l.trim().is_empty()) {
            return normalize_lyrics(embedded);
        }
        let artist = record.grouping_artist().to_string();
        let title = record.display_title(path);
        normalize_lyrics(&fetch_lyrics(&artist, &title))
    }
}
