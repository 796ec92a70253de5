use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use super::output::{self, OutputArgs};
use crate::core::lyrics::LyricsRecord;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct LoadArgs {
    /// LRC or JSON lyrics file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn execute(args: LoadArgs, services: &SimpleServices) -> Result<()> {
    let config = services.config();
    let none_char = args.output.none_char.as_deref().unwrap_or(&config.none_char);

    let record = read_lyrics_file(&args.file, none_char)?;
    output::emit(record, &args.output)
}

/// `.json` files are read as JSON, anything else as LRC.
pub fn read_lyrics_file(path: &Path, none_char: &str) -> Result<LyricsRecord> {
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let record = if is_json {
        LyricsRecord::from_json_file(path, none_char)
    } else {
        LyricsRecord::from_lrc_file(path, none_char)
    };
    record.with_context(|| format!("Failed to load lyrics from {}", path.display()))
}
