/// The request module turns a natural-language pick request ("play me 15 upbeat jazz songs
/// from the 90s") into filter criteria, using the OpenRouter chat-completions API.
///
/// Failures here are routine (no API key, flaky network, model returning prose instead of
/// JSON), so the parse returns an error string for the caller to display rather than a crash
/// or a crate error.
use crate::config::Config;
use crate::errors::Result;
use crate::lyrics::RetryConfig;
use crate::playlist::{clamp_pick_count, FilterCriteria};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

const CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const APP_REFERER: &str = "https://shuffle-rs.app";
const APP_TITLE: &str = "Shuffle";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Models rarely return bare JSON; pull the outermost brace-delimited blob out of whatever
/// prose surrounds it.
static JSON_BLOB_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)(\{.*\})").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
}

impl AssistantConfig {
    pub fn load(c: &Config) -> AssistantConfig {
        crate::config::read_document_or_default(&c.assistant_config_path())
    }

    pub fn save(&self, c: &Config) -> Result<()> {
        crate::config::write_document(&c.assistant_config_path(), self)
    }

    pub fn model(&self) -> &str {
        self.model_id.as_deref().filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MODEL)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPickRequest {
    pub criteria: FilterCriteria,
    pub count: Option<usize>,
    pub duration_sec: Option<u64>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

/// The reply shape we ask the model for. Everything is optional; the model omits dimensions
/// the user did not mention.
#[derive(Deserialize)]
struct AssistantReply {
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    count: Option<i64>,
    #[serde(default)]
    duration_sec: Option<i64>,
    #[serde(default)]
    year_start: Option<i32>,
    #[serde(default)]
    year_end: Option<i32>,
    #[serde(default)]
    title_keywords: Vec<String>,
    #[serde(default)]
    album_keywords: Vec<String>,
    #[serde(default)]
    artist_keywords: Vec<String>,
}

/// Parse a natural-language pick request into filter criteria.
pub fn parse_pick_request(cfg: &AssistantConfig, query: &str, known_genres: &[String]) -> std::result::Result<ParsedPickRequest, String> {
    let messages = vec![
        ChatMessage {
            role: "system",
            content: format!(
                "You help users filter a music library and pick songs. Available genres: {}. \
                 Respond with only a JSON object of the form {{\"genres\": [], \"count\": null, \
                 \"duration_sec\": null, \"year_start\": null, \"year_end\": null, \
                 \"title_keywords\": [], \"album_keywords\": [], \"artist_keywords\": []}}. \
                 Only include genres from the available list. Omit or null anything the user \
                 did not ask for.",
                known_genres.join(", ")
            ),
        },
        ChatMessage {
            role: "user",
            content: query.to_string(),
        },
    ];

    let content = chat_completion(cfg, messages, &RetryConfig::default())?;
    parse_assistant_reply(&content, known_genres)
}

/// Extract and validate the JSON blob from a model reply. Split out from the HTTP round-trip
/// so it can be exercised directly.
pub(crate) fn parse_assistant_reply(content: &str, known_genres: &[String]) -> std::result::Result<ParsedPickRequest, String> {
    let blob = JSON_BLOB_REGEX
        .captures(content)
        .and_then(|c| c.get(1))
        .ok_or_else(|| "Could not extract a JSON object from the assistant response".to_string())?;
    let reply: AssistantReply = serde_json::from_str(blob.as_str()).map_err(|e| format!("Failed to parse assistant response: {e}"))?;

    let criteria = FilterCriteria {
        genres: reply.genres.into_iter().filter(|g| known_genres.contains(g)).collect(),
        year_start: reply.year_start,
        year_end: reply.year_end,
        title_keywords: reply.title_keywords,
        album_keywords: reply.album_keywords,
        artist_keywords: reply.artist_keywords,
    };
    let count = reply.count.map(|c| clamp_pick_count(c.max(0) as usize));
    let duration_sec = reply.duration_sec.filter(|&d| d > 0).map(|d| d as u64);

    Ok(ParsedPickRequest {
        criteria,
        count,
        duration_sec,
    })
}

fn chat_completion(cfg: &AssistantConfig, messages: Vec<ChatMessage>, retry: &RetryConfig) -> std::result::Result<String, String> {
    let api_key = cfg.api_key.as_deref().filter(|k| !k.is_empty()).ok_or_else(|| "No API key configured. Please add your OpenRouter API key in settings.".to_string())?;

    let client = reqwest::blocking::Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| format!("Failed to construct HTTP client: {e}"))?;
    let request = ChatRequest {
        model: cfg.model(),
        messages,
    };

    for attempt in 0..retry.max_attempts {
        let response = client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(api_key)
            .header("HTTP-Referer", APP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request)
            .send();
        match response {
            Ok(response) => {
                if !response.status().is_success() {
                    return Err(format!("Assistant API request failed with status {}", response.status()));
                }
                let body: ChatResponse = response.json().map_err(|e| format!("Failed to decode assistant response: {e}"))?;
                return body.choices.into_iter().next().map(|c| c.message.content).ok_or_else(|| "Assistant response contained no choices".to_string());
            }
            Err(e) if (e.is_timeout() || e.is_connect()) && attempt + 1 < retry.max_attempts => {
                let delay = retry.backoff_duration(attempt);
                debug!("Assistant request attempt {} failed ({e}), retrying in {delay:?}", attempt + 1);
                std::thread::sleep(delay);
            }
            Err(e) => return Err(format!("Assistant API request failed after {} attempts: {e}", attempt + 1)),
        }
    }
    Err(format!("Assistant API request failed after {} attempts", retry.max_attempts))
}
