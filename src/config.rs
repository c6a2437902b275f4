/// The config module owns the on-disk configuration surface: where the persistent documents
/// live, the selected music folders, and the small user settings document.
///
/// Reads are tolerant: a missing or corrupt document yields the default value with a logged
/// warning, never an error. Writes go through the crate Result type so callers can surface
/// failures if they care to.
use crate::errors::{Result, ShuffleError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_PICK_COUNT: usize = 10;
pub const DEFAULT_THEME: &str = "Soft";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_dir: PathBuf,
}

impl Config {
    /// Locate (and create if needed) the per-user config directory.
    pub fn load() -> Result<Config> {
        let config_dir = match std::env::var("SHUFFLE_CONFIG_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir()
                .ok_or_else(|| ShuffleError::Generic("Failed to locate the user config directory".to_string()))?
                .join("shuffle"),
        };
        fs::create_dir_all(&config_dir)?;
        Ok(Config { config_dir })
    }

    pub fn tags_cache_path(&self) -> PathBuf {
        self.config_dir.join("tags_cache.json")
    }

    pub fn folders_path(&self) -> PathBuf {
        self.config_dir.join("selected_folders.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    pub fn assistant_config_path(&self) -> PathBuf {
        self.config_dir.join("openrouter_api_key.json")
    }
}

/// Read the persisted folder list. A missing or unreadable document yields an empty list.
pub fn load_selected_folders(c: &Config) -> Vec<PathBuf> {
    read_document_or_default(&c.folders_path())
}

/// Rewrite the persisted folder list. Called whenever the selection changes.
pub fn save_selected_folders(c: &Config, folders: &[PathBuf]) -> Result<()> {
    write_document(&c.folders_path(), &folders)
}

/// Small user settings document. Theme names round-trip untouched; rendering is the
/// caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_pick_count")]
    pub pick_count: usize,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_pick_count() -> usize {
    DEFAULT_PICK_COUNT
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pick_count: default_pick_count(),
            theme: default_theme(),
        }
    }
}

impl Settings {
    pub fn load(c: &Config) -> Settings {
        read_document_or_default(&c.settings_path())
    }

    pub fn save(&self, c: &Config) -> Result<()> {
        write_document(&c.settings_path(), self)
    }
}

pub(crate) fn read_document_or_default<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return T::default(),
    };
    match serde_json::from_str(&contents) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
            T::default()
        }
    }
}

pub(crate) fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string(value)?;
    fs::write(path, contents)?;
    Ok(())
}
