use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use super::load::read_lyrics_file;
use crate::core::lyrics::LyricsRecord;
use crate::core::services::PublishRequest;
use crate::error::LyriqError;
use crate::services::SimpleServices;
use crate::signal_handler::SignalHandler;
use crate::utils::progress::{ProgressMessages, ProgressUtils};

#[derive(Args)]
pub struct PublishArgs {
    /// LRC or JSON lyrics file to publish
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Song name
    #[arg(value_name = "SONG")]
    song: String,

    /// Artist name
    #[arg(value_name = "ARTIST")]
    artist: String,

    /// Album name
    #[arg(value_name = "ALBUM")]
    album: String,

    /// Duration in seconds (defaults to the file's)
    #[arg(short, long)]
    duration: Option<f64>,
}

pub async fn execute(args: PublishArgs, services: &SimpleServices) -> Result<()> {
    let config = services.config();
    let record = read_lyrics_file(&args.file, &config.none_char)?;
    let request = build_request(&args, &record)?;

    let signal_handler = SignalHandler::new();
    let monitor = signal_handler.start_signal_monitoring();

    info!("Publishing {} by {}", request.track_name, request.artist_name);
    let spinner = ProgressUtils::create_activity_spinner(ProgressMessages::SOLVING_CHALLENGE);
    let result = services
        .lyrics()
        .publish_lyrics_cancellable(&request, signal_handler.shutdown_flag())
        .await;
    monitor.abort();

    match result {
        Ok(true) => {
            spinner.finish_with_message(ProgressMessages::COMPLETED);
            println!(
                "✅ Published lyrics for {} by {}",
                request.track_name, request.artist_name
            );
            Ok(())
        }
        Ok(false) => {
            spinner.finish_with_message(ProgressMessages::FAILED);
            anyhow::bail!("Publish was not accepted by the server")
        }
        Err(LyriqError::Cancelled) => {
            spinner.abandon_with_message(ProgressMessages::FAILED);
            warn!("Publish cancelled");
            Err(LyriqError::Cancelled.into())
        }
        Err(e) => {
            spinner.abandon_with_message(ProgressMessages::FAILED);
            Err(e.into())
        }
    }
}

fn build_request(args: &PublishArgs, record: &LyricsRecord) -> Result<PublishRequest> {
    if record.is_empty() {
        return Err(LyriqError::Validation("No lyrics to publish".to_string()).into());
    }

    let duration = args.duration.unwrap_or(record.duration);
    if duration <= 0.0 {
        return Err(LyriqError::Validation(
            "A positive duration is required to publish (use --duration)".to_string(),
        )
        .into());
    }

    Ok(PublishRequest {
        track_name: args.song.clone(),
        artist_name: args.artist.clone(),
        album_name: args.album.clone(),
        duration,
        plain_lyrics: record
            .to_plain_string(None)
            .map(|text| text.trim_end_matches('\n').to_string())
            .unwrap_or_default(),
        synced_lyrics: record.synced_text.clone(),
    })
}
