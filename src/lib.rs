pub mod audiotags;
pub mod cache;
pub mod common;
pub mod config;
pub mod errors;
pub mod fuzzy;
pub mod library;
pub mod lyrics;
pub mod playlist;
pub mod request;
pub mod scanner;

pub use audiotags::TagRecord;
pub use cache::TagCache;
pub use config::{Config, Settings};
pub use errors::{Result, ShuffleError};
pub use library::Library;
pub use playlist::FilterCriteria;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod cache_test;
#[cfg(test)]
mod config_test;
