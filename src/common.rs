/// The common module is our grab bag of small shared toys: version info, tiny collection
/// helpers, and logging initialization.
use crate::errors::{Result, ShuffleError};
use std::collections::HashSet;
use std::fs;
use std::hash::Hash;
use std::sync::Mutex;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, EnvFilter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn uniq<T: Clone + Eq + Hash>(xs: Vec<T>) -> Vec<T> {
    let mut rv = Vec::new();
    let mut seen = HashSet::new();
    for x in xs {
        if seen.insert(x.clone()) {
            rv.push(x);
        }
    }
    rv
}

static LOGGING_INITIALIZED: Mutex<bool> = Mutex::new(false);

/// Set up the global tracing subscriber. `output` is either "stderr" or "file"; the file
/// sink lands in the user state directory (cache directory on macOS). Safe to call more
/// than once; only the first call takes effect.
pub fn initialize_logging(output: &str) -> Result<()> {
    let mut initialized = LOGGING_INITIALIZED.lock().unwrap();
    if *initialized {
        return Ok(());
    }
    *initialized = true;
    drop(initialized);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if output == "file" {
        let log_dir = dirs::state_dir()
            .or_else(dirs::cache_dir)
            .ok_or_else(|| ShuffleError::Generic("Failed to locate a state directory for logs".to_string()))?
            .join("shuffle");
        fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .max_log_files(10)
            .filename_prefix("shuffle")
            .filename_suffix("log")
            .build(&log_dir)
            .map_err(|e| ShuffleError::Generic(format!("Failed to open log file: {e}")))?;
        let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = fmt::Subscriber::builder().with_env_filter(env_filter).with_writer(non_blocking).with_target(true).finish();
        tracing::subscriber::set_global_default(subscriber).map_err(|e| ShuffleError::Generic(format!("Failed to set subscriber: {e}")))?;
    } else {
        let subscriber = fmt::Subscriber::builder().with_env_filter(env_filter).with_target(true).finish();
        tracing::subscriber::set_global_default(subscriber).map_err(|e| ShuffleError::Generic(format!("Failed to set subscriber: {e}")))?;
    }

    Ok(())
}
