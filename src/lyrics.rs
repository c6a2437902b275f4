/// The lyrics module fetches lyrics from the lyrics.ovh API when a file carries no embedded
/// lyrics. The fetch is strictly best-effort: any failure, including a missing entry on the
/// service, yields an empty string rather than an error.
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const LYRICS_API_BASE: &str = "https://api.lyrics.ovh/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

static BLANK_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff: base, 2x base, 4x base, ... capped at ten seconds.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let ms = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(ms.min(10_000))
    }
}

#[derive(Deserialize)]
struct LyricsResponse {
    #[serde(default)]
    lyrics: Option<String>,
}

/// Fetch lyrics for a song. Transient transport errors are retried with backoff; everything
/// else (missing entry, bad payload, no such song) degrades to an empty string.
pub fn fetch_lyrics(artist: &str, title: &str) -> String {
    fetch_lyrics_with_retry(artist, title, &RetryConfig::default())
}

pub fn fetch_lyrics_with_retry(artist: &str, title: &str, retry: &RetryConfig) -> String {
    let client = match reqwest::blocking::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("Failed to construct HTTP client for lyrics fetch: {e}");
            return String::new();
        }
    };
    let url = lyrics_url(artist, title);

    for attempt in 0..retry.max_attempts {
        match client.get(&url).send() {
            Ok(response) => {
                if !response.status().is_success() {
                    debug!("No lyrics found for {artist} - {title} (status {})", response.status());
                    return String::new();
                }
                return match response.json::<LyricsResponse>() {
                    Ok(body) => body.lyrics.unwrap_or_default(),
                    Err(e) => {
                        debug!("Failed to decode lyrics response for {artist} - {title}: {e}");
                        String::new()
                    }
                };
            }
            Err(e) if (e.is_timeout() || e.is_connect()) && attempt + 1 < retry.max_attempts => {
                let delay = retry.backoff_duration(attempt);
                debug!("Lyrics fetch attempt {} failed ({e}), retrying in {delay:?}", attempt + 1);
                std::thread::sleep(delay);
            }
            Err(e) => {
                warn!("Lyrics fetch failed for {artist} - {title}: {e}");
                return String::new();
            }
        }
    }
    String::new()
}

pub(crate) fn lyrics_url(artist: &str, title: &str) -> String {
    format!("{LYRICS_API_BASE}/{}/{}", urlencoding::encode(artist), urlencoding::encode(title))
}

/// Normalize fetched or embedded lyrics for display: unify line endings and collapse runs of
/// blank lines.
pub fn normalize_lyrics(s: &str) -> String {
    let unified = s.replace("\r\n", "\n").replace('\r', "\n");
    BLANK_RUN_REGEX.replace_all(&unified, "\n").trim().to_string()
}
