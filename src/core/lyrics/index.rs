//! Timestamp → line index built from synced or plain lyric text.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::timestamp;

/// Placeholder used for empty lyric lines unless the caller picks another.
pub const DEFAULT_NONE_CHAR: &str = "♪";

/// Ordered timestamp → line mapping.
///
/// Keys keep their source order and are not sorted. Re-inserting an existing
/// key replaces its text in place. Consumers that need chronological order go
/// through [`LineIndex::sorted`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineIndex {
    entries: Vec<(String, String)>,
}

/// One line of a chronologically sorted index.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedLine<'a> {
    pub seconds: f64,
    pub timestamp: &'a str,
    pub text: &'a str,
}

impl LineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from raw synced and plain texts.
    ///
    /// Synced text wins whenever it is non-empty. Plain-only lyrics get
    /// synthetic `"{index:02}.00"` keys.
    pub fn build(synced_text: &str, plain_text: &str, none_char: &str) -> Self {
        if synced_text.is_empty() {
            Self::from_plain(plain_text, none_char)
        } else {
            Self::from_synced(synced_text, none_char)
        }
    }

    fn from_plain(plain_text: &str, none_char: &str) -> Self {
        let mut index = Self::new();
        if plain_text.is_empty() {
            return index;
        }

        for (idx, line) in plain_text.split('\n').enumerate() {
            index.insert(format!("{:02}.00", idx), content_or(line, none_char));
        }
        index
    }

    fn from_synced(synced_text: &str, none_char: &str) -> Self {
        let mut index = Self::new();

        for (timestamp, content) in synced_text.split('\n').filter_map(split_timed_line) {
            // the first character is dropped whatever it is
            let key = timestamp
                .char_indices()
                .nth(1)
                .map_or("", |(start, _)| &timestamp[start..]);
            index.insert(key.to_string(), content_or(content, none_char));
        }
        index
    }

    pub fn insert(&mut self, timestamp: String, text: String) {
        match self.entries.iter_mut().find(|(key, _)| *key == timestamp) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((timestamp, text)),
        }
    }

    pub fn get(&self, timestamp: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == timestamp)
            .map(|(_, text)| text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, text)| (key.as_str(), text.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Entries ordered by parsed timestamp. Keys that are not timestamps
    /// (stray tags inside a synced body) are left out.
    pub fn sorted(&self) -> Vec<TimedLine<'_>> {
        let mut lines: Vec<TimedLine<'_>> = self
            .entries
            .iter()
            .filter_map(|(key, text)| {
                timestamp::parse(key).ok().map(|seconds| TimedLine {
                    seconds,
                    timestamp: key,
                    text,
                })
            })
            .collect();
        lines.sort_by(|a, b| a.seconds.total_cmp(&b.seconds));
        lines
    }

    /// Position in [`LineIndex::sorted`] of the line showing at `seconds`.
    pub fn current_line(&self, seconds: f64) -> Option<usize> {
        let sorted = self.sorted();
        if sorted.is_empty() {
            return None;
        }
        let position = sorted.partition_point(|line| line.seconds <= seconds);
        Some(position.saturating_sub(1))
    }
}

impl Serialize for LineIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, text) in &self.entries {
            map.serialize_entry(key, text)?;
        }
        map.end()
    }
}

/// Split a synced line at its first `]`.
///
/// Returns the bracketed head (still carrying `[`) and the trimmed content.
/// Blank lines and lines without `]` yield `None` and are dropped.
pub(crate) fn split_timed_line(line: &str) -> Option<(&str, &str)> {
    if line.trim().is_empty() {
        return None;
    }
    let end = line.find(']')?;
    Some((&line[..end], line[end + 1..].trim()))
}

fn content_or(line: &str, none_char: &str) -> String {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        none_char.to_string()
    } else {
        trimmed.to_string()
    }
}
