use anyhow::Result;
use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};

use crate::core::lyrics::timestamp::{self, format_duration};
use crate::core::lyrics::LyricsRecord;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Lrc,
    Json,
}

impl OutputFormat {
    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::Plain => "PLAIN",
            OutputFormat::Lrc => "LRC",
            OutputFormat::Json => "JSON",
        }
    }
}

/// How a fetched or loaded record is shown or saved.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print as plain text, LRC or JSON instead of the timed listing
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Save the lyrics to this file and exit
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Format used with --file
    #[arg(long, value_enum, default_value = "plain")]
    pub file_format: OutputFormat,

    /// Placeholder for empty lines
    #[arg(long)]
    pub none_char: Option<String>,

    /// Do not print track information
    #[arg(long)]
    pub no_info: bool,
}

impl OutputArgs {
    /// The record re-derived with `--none-char` when one was given.
    pub fn apply_none_char(&self, record: LyricsRecord) -> LyricsRecord {
        match &self.none_char {
            Some(none_char) if none_char != record.none_char() => record.with_none_char(none_char),
            _ => record,
        }
    }
}

/// Save or print `record` as requested.
pub fn emit(record: LyricsRecord, args: &OutputArgs) -> Result<()> {
    let record = args.apply_none_char(record);

    if let Some(path) = &args.file {
        save(&record, path, args.file_format)?;
        println!("✅ {} lyrics saved to {}", args.file_format.label(), path.display());
        return Ok(());
    }

    if !args.no_info {
        print!("{}", track_info(&record));
    }
    println!("{}", render(&record, args.format)?);
    Ok(())
}

pub fn save(record: &LyricsRecord, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Plain => record.to_plain_file(path, None)?,
        OutputFormat::Lrc => record.to_lrc_file(path)?,
        OutputFormat::Json => record.to_json_file(path)?,
    }
    Ok(())
}

/// Text for the chosen format. Without one, lines are listed by time.
pub fn render(record: &LyricsRecord, format: Option<OutputFormat>) -> Result<String> {
    let text = match format {
        Some(OutputFormat::Plain) => record.to_plain_string(None)?.trim_end().to_string(),
        Some(OutputFormat::Lrc) => record.to_lrc_string().trim_end().to_string(),
        Some(OutputFormat::Json) => record.to_json_string()?,
        None => timed_listing(record),
    };
    Ok(text)
}

fn timed_listing(record: &LyricsRecord) -> String {
    if record.is_empty() {
        return "(no lyrics)".to_string();
    }
    if !record.has_synced() {
        return record
            .line_index()
            .iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n");
    }

    record
        .line_index()
        .sorted()
        .iter()
        .map(|line| format!("[{}] {}", timestamp::format(line.seconds), line.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn track_info(record: &LyricsRecord) -> String {
    let mut info = String::from("\n🎵 Track Information\n");
    info.push_str(&format!("ID: {}\n", record.id));
    info.push_str(&format!("Name: {}\n", record.name));
    info.push_str(&format!("Track: {}\n", record.track_name));
    info.push_str(&format!("Artist: {}\n", record.artist_name));
    if !record.album_name.is_empty() {
        info.push_str(&format!("Album: {}\n", record.album_name));
    }
    info.push_str(&format!("Duration: {}\n", format_duration(record.duration)));
    info.push_str(&format!(
        "Instrumental: {}\n\n",
        if record.instrumental { "Yes" } else { "No" }
    ));
    info
}

/// One-line summary used in search listings.
pub fn summary_line(position: usize, record: &LyricsRecord) -> String {
    let album = if record.album_name.is_empty() {
        String::new()
    } else {
        format!(" - {}", record.album_name)
    };
    let kind = if record.has_synced() { "[synced]" } else { "[plain]" };

    format!(
        "[{}] {} - {}{} ({}) {}",
        position,
        record.track_name,
        record.artist_name,
        album,
        format_duration(record.duration),
        kind
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lyrics::LyricsPayload;

    fn record() -> LyricsRecord {
        LyricsRecord::from(LyricsPayload {
            id: "1".to_string(),
            name: "Song".to_string(),
            track_name: "Song".to_string(),
            artist_name: "Artist".to_string(),
            duration: 125.0,
            synced_lyrics: "[00:05.00]Second\n[00:01.00]First\n[00:07.50]".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_timed_listing_is_sorted() {
        let text = render(&record(), None).unwrap();
        assert_eq!(text, "[00:01.00] First\n[00:05.00] Second\n[00:07.50] ♪");
    }

    #[test]
    fn test_render_plain_has_no_timestamps() {
        let text = render(&record(), Some(OutputFormat::Plain)).unwrap();
        assert!(!text.contains('['));
        assert!(text.contains("First"));
    }

    #[test]
    fn test_render_empty_plain_fails() {
        let empty = LyricsRecord::default();
        assert!(render(&empty, Some(OutputFormat::Plain)).is_err());
        assert_eq!(render(&empty, None).unwrap(), "(no lyrics)");
    }

    #[test]
    fn test_none_char_override() {
        let args = OutputArgs {
            none_char: Some("-".to_string()),
            ..Default::default()
        };
        let record = args.apply_none_char(record());
        assert!(render(&record, None).unwrap().ends_with("[00:07.50] -"));
    }

    #[test]
    fn test_track_info_and_summary() {
        let info = track_info(&record());
        assert!(info.contains("Duration: 2:05"));
        assert!(!info.contains("Album:"));

        assert_eq!(summary_line(1, &record()), "[1] Song - Artist (2:05) [synced]");
    }

    #[test]
    fn test_save_each_format() {
        let dir = tempfile::tempdir().unwrap();
        for (format, name) in [
            (OutputFormat::Plain, "song.txt"),
            (OutputFormat::Lrc, "song.lrc"),
            (OutputFormat::Json, "song.json"),
        ] {
            let path = dir.path().join(name);
            save(&record(), &path, format).unwrap();
            assert!(path.exists(), "{} not written", name);
        }
    }
}
