/// The scanner module walks the selected folders for audio files and warms the tag cache.
/// Scans can run on a background thread with polled progress and cooperative cancellation,
/// since walking a large library with cold tags takes a while.
use crate::audiotags::SUPPORTED_AUDIO_EXTENSIONS;
use crate::cache::TagCache;
use crate::common::uniq;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Progress shared between the scan worker and the interactive surface. The surface polls
/// `scanned`/`total`; clearing `running` asks the worker to stop at the next file boundary.
#[derive(Debug, Default)]
pub struct ScanProgress {
    pub scanned: AtomicUsize,
    pub total: AtomicUsize,
    pub running: AtomicBool,
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub files: Vec<PathBuf>,
    pub genres: BTreeSet<String>,
    /// False when the scan was cancelled partway. Tags extracted before the cancellation are
    /// already in the shared cache either way.
    pub completed: bool,
}

pub struct ScanHandle {
    progress: Arc<ScanProgress>,
    handle: JoinHandle<ScanOutcome>,
}

impl ScanHandle {
    pub fn progress(&self) -> (usize, usize) {
        (self.progress.scanned.load(Ordering::Relaxed), self.progress.total.load(Ordering::Relaxed))
    }

    pub fn is_running(&self) -> bool {
        self.progress.running.load(Ordering::Relaxed)
    }

    /// Ask the worker to stop. Takes effect at the next file boundary.
    pub fn stop(&self) {
        self.progress.running.store(false, Ordering::Relaxed);
    }

    pub fn join(self) -> ScanOutcome {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("Scan worker panicked; treating as an empty cancelled scan");
                ScanOutcome {
                    files: vec![],
                    genres: BTreeSet::new(),
                    completed: false,
                }
            }
        }
    }
}

fn is_supported(path: &Path) -> bool {
    let extension = path.extension().and_then(|s| s.to_str()).map(|s| format!(".{}", s.to_lowercase())).unwrap_or_default();
    SUPPORTED_AUDIO_EXTENSIONS.contains(&extension.as_str())
}

/// Recursively collect supported audio files under the given folders, deduplicated, in a
/// deterministic order.
pub fn find_audio_files(folders: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = vec![];
    for folder in folders {
        for entry in WalkDir::new(folder).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_supported(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    let mut files = uniq(files);
    files.sort();
    files
}

/// Scan synchronously on the calling thread.
pub fn scan_library(folders: &[PathBuf], cache: &mut TagCache) -> ScanOutcome {
    let files = find_audio_files(folders);
    let mut genres = BTreeSet::new();
    for path in &files {
        genres.extend(cache.get_or_extract(path).genres.iter().cloned());
    }
    cache.save();
    info!("Scanned {} files across {} folders", files.len(), folders.len());
    ScanOutcome {
        files,
        genres,
        completed: true,
    }
}

/// Scan on a background thread. The cache lock is taken per file so on-demand lookups from
/// the interactive surface interleave with the scan instead of blocking behind it.
pub fn spawn_scan(folders: Vec<PathBuf>, cache: Arc<Mutex<TagCache>>) -> ScanHandle {
    let progress = Arc::new(ScanProgress::default());
    progress.running.store(true, Ordering::Relaxed);

    let worker_progress = Arc::clone(&progress);
    let handle = std::thread::spawn(move || {
        let files = find_audio_files(&folders);
        worker_progress.total.store(files.len(), Ordering::Relaxed);
        debug!("Background scan starting over {} files", files.len());

        let mut genres = BTreeSet::new();
        let mut completed = true;
        for path in &files {
            if !worker_progress.running.load(Ordering::Relaxed) {
                info!("Background scan cancelled after {} files", worker_progress.scanned.load(Ordering::Relaxed));
                completed = false;
                break;
            }
            {
                let mut cache = cache.lock().unwrap();
                genres.extend(cache.get_or_extract(path).genres.iter().cloned());
            }
            worker_progress.scanned.fetch_add(1, Ordering::Relaxed);
        }

        cache.lock().unwrap().save();
        worker_progress.running.store(false, Ordering::Relaxed);
        if completed {
            info!("Background scan finished over {} files", files.len());
        }
        ScanOutcome {
            files,
            genres,
            completed,
        }
    });

    ScanHandle { progress, handle }
}
