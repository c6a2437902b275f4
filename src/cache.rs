/// The cache module encapsulates the persistent tag cache: a mapping from absolute file path
/// to the tags extracted from that file, serialized as a single JSON document.
///
/// The cache is an optimization, never a source of truth. Losing it only costs a re-scan, so
/// loading tolerates a missing or corrupt store and saving failures degrade to a warning.
use crate::audiotags::{read_tags, split_genre_tag, TagRecord};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct TagCache {
    store_path: PathBuf,
    entries: HashMap<String, TagRecord>,
    dirty: bool,
}

impl TagCache {
    /// Load the cache from its store path. Missing or corrupt stores yield an empty cache;
    /// this never fails.
    pub fn load(store_path: &Path) -> TagCache {
        let entries = read_store(store_path);
        debug!("Loaded tag cache from {} with {} entries", store_path.display(), entries.len());
        TagCache {
            store_path: store_path.to_path_buf(),
            entries,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, path: &Path) -> Option<&TagRecord> {
        self.entries.get(&path_key(path))
    }

    /// Return the cached record for a path, extracting and memoizing it on a miss.
    /// Extraction failures degrade to the empty record, which is cached too: a file that
    /// cannot be read once will likely not be readable next sweep either.
    pub fn get_or_extract(&mut self, path: &Path) -> TagRecord {
        let key = path_key(path);
        if let Some(record) = self.entries.get(&key) {
            return record.clone();
        }
        let record = read_tags(path);
        self.entries.insert(key, record.clone());
        self.dirty = true;
        record
    }

    pub fn insert(&mut self, path: String, record: TagRecord) {
        self.entries.insert(path, record);
        self.dirty = true;
    }

    /// Persist the cache if it has changed since the last save. Failures are logged and the
    /// dirty flag stays set so a later save can retry.
    pub fn save(&mut self) {
        if !self.dirty {
            return;
        }
        match write_store(&self.store_path, &self.entries) {
            Ok(()) => {
                debug!("Saved tag cache with {} entries to {}", self.entries.len(), self.store_path.display());
                self.dirty = false;
            }
            Err(e) => warn!("Failed to save tag cache to {}: {}", self.store_path.display(), e),
        }
    }

    /// Drop every entry and immediately persist the empty mapping. This is the only way the
    /// cache shrinks; normal operation only adds and updates entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.dirty = true;
        self.save();
    }

    /// Recompute every record's genre list from its raw genre string. Records written before
    /// a splitting-rule change carry stale lists; re-deriving from the raw string brings them
    /// in line with what live extraction would produce. Safe to run any number of times.
    pub fn migrate(&mut self) {
        let mut changed = 0;
        for record in self.entries.values_mut() {
            let genres = split_genre_tag(record.genre.as_deref());
            if record.genres != genres {
                record.genres = genres;
                changed += 1;
            }
        }
        if changed > 0 {
            info!("Migrated genre lists for {changed} cached records");
            self.dirty = true;
            self.save();
        }
    }

    /// Sorted unique genres across all cached records.
    pub fn genre_vocabulary(&self) -> Vec<String> {
        self.entries.values().flat_map(|r| r.genres.iter().cloned()).collect::<std::collections::BTreeSet<_>>().into_iter().collect()
    }
}

pub(crate) fn path_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn read_store(path: &Path) -> HashMap<String, TagRecord> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return HashMap::new(),
    };
    // One malformed record degrades to the empty default; it poisons only itself, not the
    // whole store.
    match serde_json::from_str::<HashMap<String, serde_json::Value>>(&contents) {
        Ok(raw) => raw.into_iter().map(|(k, v)| (k, serde_json::from_value(v).unwrap_or_default())).collect(),
        Err(e) => {
            warn!("Failed to parse tag cache at {}: {}. Starting from an empty cache.", path.display(), e);
            HashMap::new()
        }
    }
}

fn write_store(path: &Path, entries: &HashMap<String, TagRecord>) -> crate::errors::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string(entries)?;
    fs::write(path, contents)?;
    Ok(())
}
