use anyhow::Result;
use clap::Args;
use indicatif::ProgressBar;
use std::path::PathBuf;
use tracing::info;

use crate::core::services::dumps::{format_file_size, sort_newest_first, DatabaseDump};
use crate::services::SimpleServices;
use crate::utils::progress::{ProgressMessages, ProgressUtils};

#[derive(Args)]
pub struct DumpsArgs {
    /// Download the dump at this position (1-based, newest first)
    #[arg(short, long)]
    index: Option<usize>,

    /// Where to save the download (defaults to the cache directory)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Only list the dumps, even when --index is given
    #[arg(short, long)]
    list: bool,
}

pub async fn execute(args: DumpsArgs, services: &SimpleServices) -> Result<()> {
    let lyrics = services.lyrics();

    info!("Fetching database dump listing...");
    let mut dumps = lyrics.get_database_dumps().await?;
    if dumps.is_empty() {
        anyhow::bail!("No database dumps available");
    }
    sort_newest_first(&mut dumps);

    let index = match args.index {
        Some(index) if !args.list => index,
        _ => {
            print_listing(&dumps);
            return Ok(());
        }
    };

    if index == 0 || index > dumps.len() {
        anyhow::bail!("Dump index {} out of range (1-{})", index, dumps.len());
    }
    let dump = &dumps[index - 1];

    let mut bar: Option<ProgressBar> = None;
    let result = lyrics
        .download_database_dump(dump, args.output.as_deref(), |downloaded, total| {
            let pb = bar.get_or_insert_with(|| {
                let pb = ProgressUtils::create_download_progress(total);
                pb.set_message(ProgressMessages::downloading(dump.filename()));
                pb
            });
            pb.set_position(downloaded);
        })
        .await;

    match result {
        Ok(path) => {
            if let Some(pb) = &bar {
                pb.finish_with_message(ProgressMessages::COMPLETED);
            }
            println!("✅ Downloaded {} to {}", dump.filename(), path.display());
            Ok(())
        }
        Err(e) => {
            if let Some(pb) = &bar {
                pb.abandon_with_message(ProgressMessages::FAILED);
            }
            Err(e.into())
        }
    }
}

fn print_listing(dumps: &[DatabaseDump]) {
    println!("💾 Available database dumps:");
    for (position, dump) in dumps.iter().enumerate() {
        println!("{}", listing_line(position + 1, dump));
    }
    println!("\n💡 Use --index N to download a dump");
}

fn listing_line(position: usize, dump: &DatabaseDump) -> String {
    format!(
        "[{}] {} ({}, uploaded {})",
        position,
        dump.filename(),
        format_file_size(dump.size),
        dump.uploaded.format("%Y-%m-%d %H:%M UTC")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_listing_line() {
        let dump = DatabaseDump {
            key: "dumps/lrclib-db-dump-20250101.sqlite3.gz".to_string(),
            size: 1536,
            uploaded: Utc.with_ymd_and_hms(2025, 1, 1, 8, 30, 0).unwrap(),
            ..Default::default()
        };

        assert_eq!(
            listing_line(2, &dump),
            "[2] lrclib-db-dump-20250101.sqlite3.gz (1.5 KB, uploaded 2025-01-01 08:30 UTC)"
        );
    }
}
