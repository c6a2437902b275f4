/// The playlist module implements random playlist building: filtering the scanned library
/// down to a candidate pool, then sampling from it with a per-artist fairness cap so a few
/// prolific artists cannot dominate a small playlist.
use crate::audiotags::TagRecord;
use crate::cache::TagCache;
use crate::config::DEFAULT_PICK_COUNT;
use crate::fuzzy::keyword_matches;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tracing::debug;

pub const MAX_PICK_COUNT: usize = 100;

/// No artist may occupy more than this share of the requested playlist size (rounded up),
/// with a floor of one so tiny requests still admit every artist once.
pub const ARTIST_SHARE_CAP: f64 = 0.6;

/// Filters are ANDed across dimensions and ORed within one: a file must satisfy every
/// populated dimension, and within a dimension any one alternative suffices. An entirely
/// empty criteria matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Exact membership against the record's canonical genre list.
    #[serde(default)]
    pub genres: HashSet<String>,
    #[serde(default)]
    pub year_start: Option<i32>,
    #[serde(default)]
    pub year_end: Option<i32>,
    #[serde(default)]
    pub title_keywords: Vec<String>,
    #[serde(default)]
    pub album_keywords: Vec<String>,
    #[serde(default)]
    pub artist_keywords: Vec<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
            && self.year_start.is_none()
            && self.year_end.is_none()
            && self.title_keywords.is_empty()
            && self.album_keywords.is_empty()
            && self.artist_keywords.is_empty()
    }

    pub fn matches(&self, tags: &TagRecord) -> bool {
        if !self.genres.is_empty() && !tags.genres.iter().any(|g| self.genres.contains(g)) {
            return false;
        }
        // A file with an unknown year is never excluded by the year range.
        if let Some(year) = tags.year {
            if self.year_start.is_some_and(|start| year < start) {
                return false;
            }
            if self.year_end.is_some_and(|end| year > end) {
                return false;
            }
        }
        if !self.title_keywords.is_empty() && !keyword_matches(tags.title.as_deref().unwrap_or(""), &self.title_keywords) {
            return false;
        }
        if !self.album_keywords.is_empty() && !keyword_matches(tags.album.as_deref().unwrap_or(""), &self.album_keywords) {
            return false;
        }
        if !self.artist_keywords.is_empty() && !keyword_matches(tags.artist.as_deref().unwrap_or(""), &self.artist_keywords) {
            return false;
        }
        true
    }
}

/// Clamp a requested playlist size to something sane: zero falls back to the default, and
/// anything above the ceiling is capped.
pub fn clamp_pick_count(n: usize) -> usize {
    if n == 0 {
        DEFAULT_PICK_COUNT
    } else {
        n.min(MAX_PICK_COUNT)
    }
}

pub fn max_per_artist(n: usize) -> usize {
    std::cmp::max(1, (ARTIST_SHARE_CAP * n as f64).ceil() as usize)
}

/// Reduce the library to the files matching the criteria, extracting tags on demand.
pub fn filter_files(files: &[PathBuf], cache: &mut TagCache, criteria: &FilterCriteria) -> Vec<PathBuf> {
    files.iter().filter(|p| criteria.matches(&cache.get_or_extract(p))).cloned().collect()
}

/// Build a random playlist of up to `n` files matching the criteria.
pub fn pick_songs(files: &[PathBuf], cache: &mut TagCache, n: usize, criteria: &FilterCriteria) -> Vec<PathBuf> {
    pick_songs_with_rng(files, cache, n, criteria, &mut rand::thread_rng())
}

/// Selection proper, generic over the randomness source so tests can seed it.
///
/// Sampling proceeds in rounds over a shuffled artist order, drawing one random unused file
/// per under-cap artist per round. An artist hitting its cap mid-round does not end the
/// round for the artists after it. Once every artist is capped or exhausted, remaining slots
/// are filled from the leftover candidates without regard to the cap, so the playlist always
/// reaches min(n, pool size).
pub fn pick_songs_with_rng<R: Rng>(files: &[PathBuf], cache: &mut TagCache, n: usize, criteria: &FilterCriteria, rng: &mut R) -> Vec<PathBuf> {
    let n = clamp_pick_count(n);
    let pool = filter_files(files, cache, criteria);
    if pool.is_empty() {
        debug!("No files match the current filters; returning an empty playlist");
        return vec![];
    }
    if pool.len() <= n {
        let mut playlist = pool;
        playlist.shuffle(rng);
        return playlist;
    }

    let mut by_artist: HashMap<String, Vec<&PathBuf>> = HashMap::new();
    for path in &pool {
        let artist = cache.get_or_extract(path).grouping_artist().to_string();
        by_artist.entry(artist).or_default().push(path);
    }

    let cap = max_per_artist(n);
    // Sort before shuffling so the order depends only on the RNG, not on hash iteration.
    let mut artists: Vec<String> = by_artist.keys().cloned().collect();
    artists.sort();
    artists.shuffle(rng);

    let mut used: HashSet<&PathBuf> = HashSet::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut playlist: Vec<PathBuf> = Vec::with_capacity(n);

    loop {
        let mut progressed = false;
        for artist in &artists {
            if playlist.len() >= n {
                break;
            }
            if counts.get(artist.as_str()).copied().unwrap_or(0) >= cap {
                continue;
            }
            let candidates: Vec<&PathBuf> = by_artist[artist].iter().copied().filter(|p| !used.contains(*p)).collect();
            if let Some(&choice) = candidates.choose(rng) {
                used.insert(choice);
                playlist.push(choice.clone());
                *counts.entry(artist.as_str()).or_insert(0) += 1;
                progressed = true;
            }
        }
        if playlist.len() >= n || !progressed {
            break;
        }
    }

    if playlist.len() < n {
        let mut leftovers: Vec<&PathBuf> = pool.iter().filter(|p| !used.contains(p)).collect();
        leftovers.shuffle(rng);
        for path in leftovers {
            if playlist.len() >= n {
                break;
            }
            playlist.push(path.clone());
        }
    }

    debug!("Picked {} songs from a pool of {}", playlist.len(), pool.len());
    playlist
}

/// Build a playlist targeting a cumulative duration instead of a track count.
pub fn pick_songs_by_duration(files: &[PathBuf], cache: &mut TagCache, target_sec: u64, criteria: &FilterCriteria) -> Vec<PathBuf> {
    pick_songs_by_duration_with_rng(files, cache, target_sec, criteria, &mut rand::thread_rng())
}

/// Shuffle the pool once and accumulate in order, stopping before the first file that would
/// push the running total past the target. The first file is always accepted so a nonempty
/// pool yields a nonempty playlist. No artist cap applies. Unknown durations count as zero.
pub fn pick_songs_by_duration_with_rng<R: Rng>(files: &[PathBuf], cache: &mut TagCache, target_sec: u64, criteria: &FilterCriteria, rng: &mut R) -> Vec<PathBuf> {
    let mut pool = filter_files(files, cache, criteria);
    pool.shuffle(rng);

    let mut total: u64 = 0;
    let mut playlist: Vec<PathBuf> = vec![];
    for path in pool {
        let duration = cache.get(&path).and_then(|r| r.duration_sec).map(|d| d.max(0) as u64).unwrap_or(0);
        if !playlist.is_empty() && total + duration > target_sec {
            break;
        }
        total += duration;
        playlist.push(path);
    }
    debug!("Picked {} songs totalling {total} seconds against a target of {target_sec}", playlist.len());
    playlist
}

/// Cumulative duration of a playlist in seconds, for the duration label.
pub fn total_duration(files: &[PathBuf], cache: &mut TagCache) -> u64 {
    files.iter().map(|p| cache.get_or_extract(p).duration_sec.map(|d| d.max(0) as u64).unwrap_or(0)).sum()
}
