/// The audiotags module abstracts over tag reading for the supported audio formats, exposing
/// a single standard record for all audio files.
///
/// Extraction never fails past this module's boundary: an unsupported filetype, an unreadable
/// file, or a parse error all degrade to an empty record, so one corrupt file can never abort
/// a library scan.
use id3::{Tag as Id3Tag, TagLike};
use metaflac::Tag as FlacTag;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw genre strings are multi-valued in the wild: separated by semicolons, pipes, commas,
/// slashes, backslashes, `>` hierarchies, or hyphens. One splitter handles all of them.
static TAG_SPLITTER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;|,/\\>\-]+").unwrap());

static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").unwrap());

pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".flac"];

/// Grouping sentinel for files with a blank or absent artist tag.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

pub const MIN_VALID_YEAR: i32 = 1900;
pub const MAX_VALID_YEAR: i32 = 2100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    /// The raw genre string as embedded in the file. Kept so the canonical `genres` list can
    /// be re-derived when the splitting rule changes.
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub duration_sec: Option<i32>,
    #[serde(default)]
    pub lyrics: Option<String>,
}

impl TagRecord {
    /// Title for display, falling back to the file stem when the tag is absent.
    pub fn display_title(&self, path: &Path) -> String {
        match &self.title {
            Some(t) if !t.trim().is_empty() => t.clone(),
            _ => path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string()),
        }
    }

    /// Artist used for fairness grouping. Blank and absent tags collapse to one bucket.
    pub fn grouping_artist(&self) -> &str {
        match &self.artist {
            Some(a) if !a.trim().is_empty() => a,
            _ => UNKNOWN_ARTIST,
        }
    }
}

/// Split a raw genre string into the canonical genre list: split on any separator run, trim
/// whitespace, discard empties, preserve order. This is the single splitting rule shared by
/// live extraction and the cache migration.
pub fn split_genre_tag(t: Option<&str>) -> Vec<String> {
    match t {
        None => vec![],
        Some(s) => TAG_SPLITTER_REGEX
            .split(s)
            .map(|x| x.trim_end_matches('\0').trim().to_string())
            .filter(|x| !x.is_empty())
            .collect(),
    }
}

/// Read tags from an audio file. Never fails: anything unreadable yields the empty record.
pub fn read_tags(p: &Path) -> TagRecord {
    let extension = p.extension().and_then(|s| s.to_str()).map(|s| format!(".{}", s.to_lowercase())).unwrap_or_default();

    if !SUPPORTED_AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        tracing::debug!("{} is not a supported filetype, returning empty tags", p.display());
        return TagRecord::default();
    }

    let result = match extension.as_str() {
        ".mp3" => read_mp3(p),
        ".flac" => read_flac(p),
        _ => unreachable!(),
    };
    match result {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Failed to read tags from {}: {}", p.display(), e);
            TagRecord::default()
        }
    }
}

fn read_mp3(p: &Path) -> std::result::Result<TagRecord, String> {
    let tag = Id3Tag::read_from_path(p).map_err(|e| format!("Failed to open file: {e}"))?;

    let genre = _get_id3_tag(&tag, &["TCON"]);
    let lyrics = tag.lyrics().next().map(|l| l.text.clone()).filter(|t| !t.is_empty());

    let duration_sec = mp3_duration::from_path(p).map(|d| d.as_secs() as i32).ok().filter(|&d| d > 0);

    Ok(TagRecord {
        title: _get_id3_tag(&tag, &["TIT2"]),
        artist: _get_id3_tag(&tag, &["TPE1"]),
        album: _get_id3_tag(&tag, &["TALB"]),
        genres: split_genre_tag(genre.as_deref()),
        genre,
        year: _parse_year(_get_id3_tag(&tag, &["TDRC", "TYER", "TDAT"]).as_deref()),
        duration_sec,
        lyrics,
    })
}

fn read_flac(p: &Path) -> std::result::Result<TagRecord, String> {
    let tag = FlacTag::read_from_path(p).map_err(|e| format!("Failed to open file: {e}"))?;

    let vorbis = tag.vorbis_comments().ok_or_else(|| "No vorbis comments in FLAC file".to_string())?;

    // Duration comes from the stream info, not the comments.
    let duration_sec = tag
        .get_streaminfo()
        .and_then(|info| {
            if info.sample_rate > 0 {
                Some((info.total_samples as f64 / info.sample_rate as f64).round() as i32)
            } else {
                None
            }
        })
        .filter(|&d| d > 0);

    // GENRE is multi-valued in vorbis comments; concatenate before splitting so the splitter
    // sees one raw string, same as the cached form.
    let genre = _get_vorbis_tag_joined(vorbis, "GENRE");

    Ok(TagRecord {
        title: _get_vorbis_tag(vorbis, &["TITLE"]),
        artist: _get_vorbis_tag(vorbis, &["ARTIST", "ALBUMARTIST"]),
        album: _get_vorbis_tag(vorbis, &["ALBUM"]),
        genres: split_genre_tag(genre.as_deref()),
        genre,
        year: _parse_year(_get_vorbis_tag(vorbis, &["DATE", "YEAR"]).as_deref()),
        duration_sec,
        lyrics: _get_vorbis_tag(vorbis, &["LYRICS", "UNSYNCEDLYRICS"]),
    })
}

fn _get_id3_tag(tag: &Id3Tag, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(text) = tag.get(key).and_then(|f| f.content().text()) {
            let cleaned = text.trim_end_matches('\0').trim();
            if !cleaned.is_empty() {
                return Some(cleaned.to_string());
            }
        }
    }
    None
}

fn _get_vorbis_tag(comments: &metaflac::block::VorbisComment, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(values) = comments.get(key) {
            if let Some(first) = values.iter().find(|v| !v.trim().is_empty()) {
                return Some(first.trim().to_string());
            }
        }
    }
    None
}

fn _get_vorbis_tag_joined(comments: &metaflac::block::VorbisComment, key: &str) -> Option<String> {
    let values: Vec<String> = comments.get(key).map(|vs| vs.iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()).unwrap_or_default();
    if values.is_empty() {
        None
    } else {
        Some(values.join(";"))
    }
}

/// Pull the first four-digit run out of a date-ish tag value. Only years within the valid
/// range are kept; everything else reads as unknown.
pub(crate) fn _parse_year(x: Option<&str>) -> Option<i32> {
    let s = x?;
    let year: i32 = YEAR_REGEX.captures(s)?.get(1)?.as_str().parse().ok()?;
    if (MIN_VALID_YEAR..=MAX_VALID_YEAR).contains(&year) {
        Some(year)
    } else {
        None
    }
}
