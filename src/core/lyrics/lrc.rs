//! Conversions between [`LyricsRecord`], LRC text and plain text.
//!
//! An LRC document is a block of `[tag:value]` metadata lines, a blank line,
//! then either timestamped lines or untimed plain lines. The metadata tags
//! written and understood here:
//!
//! | tag              | field                     |
//! |------------------|---------------------------|
//! | `ti`             | track name (and name)     |
//! | `ar`             | artist                    |
//! | `al`             | album                     |
//! | `by`             | artist (written only)     |
//! | `length`         | duration in seconds       |
//! | `x-name`         | display name              |
//! | `x-id`           | LRCLIB id                 |
//! | `x-instrumental` | `true` for instrumentals  |

use std::fs;
use std::path::Path;
use tracing::debug;

use super::index::split_timed_line;
use super::record::{LyricsPayload, LyricsRecord};
use crate::error::{LyriqError, Result};

/// Strip timestamps from synced text, one content line per timed line.
///
/// Blank lines and lines without `]` are dropped; empty content becomes
/// `none_char`. Every emitted line ends with `\n`.
pub fn to_plain_lyrics(synced_text: &str, none_char: &str) -> String {
    synced_text
        .split('\n')
        .filter_map(split_timed_line)
        .map(|(_, content)| {
            let content = if content.is_empty() { none_char } else { content };
            format!("{}\n", content)
        })
        .collect()
}

impl LyricsRecord {
    /// Plain text of the record.
    ///
    /// Synced text is authoritative whenever present: it is stripped of
    /// timestamps, using `none_char` (or the record's own placeholder) for
    /// empty lines. Plain-only records return their text with a trailing newline.
    pub fn to_plain_string(&self, none_char: Option<&str>) -> Result<String> {
        if !self.synced_text.is_empty() {
            let none_char = none_char.unwrap_or(self.none_char());
            return Ok(to_plain_lyrics(&self.synced_text, none_char));
        }
        if !self.plain_text.is_empty() {
            return Ok(format!("{}\n", self.plain_text));
        }
        Err(LyriqError::empty_content("plain text"))
    }

    /// Write the plain text to `path`. Nothing is written for an empty record.
    pub fn to_plain_file<P: AsRef<Path>>(&self, path: P, none_char: Option<&str>) -> Result<()> {
        let content = self
            .to_plain_string(none_char)
            .map_err(|_| LyriqError::empty_content("plain text file"))?;
        fs::write(path.as_ref(), content)?;
        debug!("Wrote plain lyrics to {}", path.as_ref().display());
        Ok(())
    }

    /// Render as an LRC document: populated metadata tags, a blank line,
    /// then the synced body (or the plain body when there is none).
    pub fn to_lrc_string(&self) -> String {
        let duration = if self.duration > 0.0 {
            self.duration.to_string()
        } else {
            String::new()
        };
        let instrumental = if self.instrumental { "true" } else { "" };

        let tags = [
            ("ti", self.track_name.as_str()),
            ("ar", self.artist_name.as_str()),
            ("al", self.album_name.as_str()),
            ("by", self.artist_name.as_str()),
            ("length", duration.as_str()),
            ("x-name", self.name.as_str()),
            ("x-id", self.id.as_str()),
            ("x-instrumental", instrumental),
        ];

        let mut result: String = tags
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(tag, value)| format!("[{}:{}]\n", tag, value))
            .collect();
        result.push('\n');

        if self.synced_text.is_empty() {
            result.push_str(&self.plain_text);
        } else {
            result.push_str(&self.synced_text);
        }
        result
    }

    pub fn to_lrc_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.to_lrc_string())?;
        debug!("Wrote LRC lyrics to {}", path.as_ref().display());
        Ok(())
    }

    pub fn from_lrc_string(lrc: &str, none_char: &str) -> Self {
        let (metadata, body) = split_sections(lrc);

        let mut payload = LyricsPayload::default();
        apply_metadata(&mut payload, &metadata);
        apply_body(&mut payload, &body, none_char);

        LyricsRecord::from_payload(payload, none_char)
    }

    pub fn from_lrc_file<P: AsRef<Path>>(path: P, none_char: &str) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(Self::from_lrc_string(&content, none_char))
    }
}

/// Leading `[tag:value]` lines versus everything else.
///
/// The metadata block ends at the first blank line (which is consumed) or at
/// the first line that is not a metadata tag (which starts the body).
fn split_sections(lrc: &str) -> (Vec<&str>, Vec<&str>) {
    let mut metadata = Vec::new();
    let mut body = Vec::new();
    let mut in_metadata = true;

    for raw in lrc.split('\n') {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if in_metadata {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                in_metadata = false;
                continue;
            }
            if is_metadata_line(trimmed) {
                metadata.push(trimmed);
                continue;
            }
            in_metadata = false;
        }
        body.push(line);
    }

    (metadata, body)
}

/// `[tag:value]` whose tag is not numeric, so `[00:12.00]` stays a lyric line.
fn is_metadata_line(line: &str) -> bool {
    let Some(inner) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) else {
        return false;
    };
    match inner.split_once(':') {
        Some((tag, _)) => tag
            .chars()
            .next()
            .is_some_and(|first| !first.is_ascii_digit()),
        None => false,
    }
}

fn apply_metadata(payload: &mut LyricsPayload, lines: &[&str]) {
    let mut explicit_name = None;

    for line in lines {
        let inner = &line[1..line.len() - 1];
        let Some((tag, value)) = inner.split_once(':') else {
            continue;
        };

        match tag.trim() {
            "ti" => {
                payload.track_name = value.to_string();
                payload.name = value.to_string();
            }
            "ar" => payload.artist_name = value.to_string(),
            "al" => payload.album_name = value.to_string(),
            "length" => match value.trim().parse::<f64>() {
                Ok(duration) => payload.duration = duration,
                Err(_) => debug!("Ignoring non-numeric length tag: {}", value),
            },
            "x-name" => explicit_name = Some(value.to_string()),
            "x-id" => payload.id = value.to_string(),
            "x-instrumental" => payload.instrumental = value.trim().eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    if let Some(name) = explicit_name {
        payload.name = name;
    }
}

fn apply_body(payload: &mut LyricsPayload, lines: &[&str], none_char: &str) {
    let non_blank: Vec<&str> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();

    let is_synced = non_blank
        .iter()
        .all(|line| line.starts_with('[') && line.find(']').is_some_and(|end| end > 1));

    if is_synced {
        payload.synced_lyrics = non_blank.join("\n");
        payload.plain_lyrics = to_plain_lyrics(&payload.synced_lyrics, none_char);
    } else {
        payload.plain_lyrics = lines.join("\n");
    }
}
