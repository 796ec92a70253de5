//! Lyrics records, the LRCLIB payload shape and the JSON export form.

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::index::{LineIndex, DEFAULT_NONE_CHAR};
use crate::error::{LyriqError, Result};

/// Lyrics payload as the LRCLIB API and the lyrics cache store it.
///
/// Every field is optional upstream; missing or `null` values fall back to
/// empty strings, zero and `false`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LyricsPayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub track_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub artist_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub album_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub instrumental: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub plain_lyrics: String,
    #[serde(deserialize_with = "null_as_default")]
    pub synced_lyrics: String,
}

/// Structured export form written by `to_json_file`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LyricsExport {
    #[serde(skip_deserializing)]
    pub lyrics: LineIndex,
    #[serde(deserialize_with = "null_as_default")]
    pub synced_lyrics: String,
    #[serde(deserialize_with = "null_as_default")]
    pub plain_lyrics: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub track_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub artist_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub album_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub instrumental: bool,
}

/// A song's lyrics plus metadata.
///
/// `line_index` is derived from `synced_text`/`plain_text` and is rebuilt
/// through [`LyricsRecord::with_none_char`], never edited directly.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsRecord {
    pub id: String,
    pub name: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration: f64,
    pub instrumental: bool,
    pub synced_text: String,
    pub plain_text: String,
    line_index: LineIndex,
    none_char: String,
}

impl Default for LyricsRecord {
    fn default() -> Self {
        Self::from_payload(LyricsPayload::default(), DEFAULT_NONE_CHAR)
    }
}

impl LyricsRecord {
    pub fn from_payload(payload: LyricsPayload, none_char: &str) -> Self {
        let line_index = LineIndex::build(&payload.synced_lyrics, &payload.plain_lyrics, none_char);

        Self {
            id: payload.id,
            name: payload.name,
            track_name: payload.track_name,
            artist_name: payload.artist_name,
            album_name: payload.album_name,
            duration: payload.duration,
            instrumental: payload.instrumental,
            synced_text: payload.synced_lyrics,
            plain_text: payload.plain_lyrics,
            line_index,
            none_char: none_char.to_string(),
        }
    }

    pub fn to_payload(&self) -> LyricsPayload {
        LyricsPayload {
            id: self.id.clone(),
            name: self.name.clone(),
            track_name: self.track_name.clone(),
            artist_name: self.artist_name.clone(),
            album_name: self.album_name.clone(),
            duration: self.duration,
            instrumental: self.instrumental,
            plain_lyrics: self.plain_text.clone(),
            synced_lyrics: self.synced_text.clone(),
        }
    }

    /// Same record with the index rebuilt around a different empty-line placeholder.
    pub fn with_none_char(&self, none_char: &str) -> Self {
        Self::from_payload(self.to_payload(), none_char)
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn none_char(&self) -> &str {
        &self.none_char
    }

    /// A record counts as empty when its line index has no entries.
    pub fn is_empty(&self) -> bool {
        self.line_index.is_empty()
    }

    pub fn has_synced(&self) -> bool {
        !self.synced_text.trim().is_empty()
    }

    pub fn to_export(&self) -> LyricsExport {
        LyricsExport {
            lyrics: self.line_index.clone(),
            synced_lyrics: self.synced_text.clone(),
            plain_lyrics: self.plain_text.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            track_name: self.track_name.clone(),
            artist_name: self.artist_name.clone(),
            album_name: self.album_name.clone(),
            duration: self.duration,
            instrumental: self.instrumental,
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_export())?)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string(&self.to_export())?;
        fs::write(path.as_ref(), content)?;
        debug!("Wrote JSON lyrics to {}", path.as_ref().display());
        Ok(())
    }

    /// Parse either the export shape (snake_case keys) or a raw API payload.
    pub fn from_json_str(content: &str, none_char: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;

        let payload = if value.get("synced_lyrics").is_some() {
            let export: LyricsExport = serde_json::from_value(value)?;
            LyricsPayload {
                id: export.id,
                name: export.name,
                track_name: export.track_name,
                artist_name: export.artist_name,
                album_name: export.album_name,
                duration: export.duration,
                instrumental: export.instrumental,
                plain_lyrics: export.plain_lyrics,
                synced_lyrics: export.synced_lyrics,
            }
        } else {
            serde_json::from_value(value)?
        };

        Ok(Self::from_payload(payload, none_char))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P, none_char: &str) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content, none_char)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// LRCLIB ids are integers; local files may carry them as strings.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Number(id)) => id.to_string(),
        Some(RawId::Text(id)) => id,
        None => String::new(),
    })
}

impl From<LyricsPayload> for LyricsRecord {
    fn from(payload: LyricsPayload) -> Self {
        LyricsRecord::from_payload(payload, DEFAULT_NONE_CHAR)
    }
}

impl TryFrom<&str> for LyricsPayload {
    type Error = LyriqError;

    fn try_from(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
