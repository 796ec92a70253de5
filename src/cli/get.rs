use anyhow::Result;
use clap::Args;
use tracing::info;

use super::output::{self, OutputArgs};
use crate::services::SimpleServices;

#[derive(Args)]
pub struct GetArgs {
    /// Song name
    #[arg(value_name = "SONG", required_unless_present = "id")]
    song: Option<String>,

    /// Artist name
    #[arg(value_name = "ARTIST", required_unless_present = "id")]
    artist: Option<String>,

    /// Album name (narrows the match)
    #[arg(value_name = "ALBUM")]
    album: Option<String>,

    /// Duration in seconds (helps with matching)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Look up by LRCLIB id instead of names
    #[arg(long)]
    id: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn execute(args: GetArgs, services: &SimpleServices) -> Result<()> {
    let lyrics = services.lyrics();

    let (record, wanted) = match (&args.id, &args.song, &args.artist) {
        (Some(id), _, _) => {
            info!("Getting lyrics for id {}", id);
            (lyrics.get_lyrics_by_id(id).await?, format!("id {}", id))
        }
        (None, Some(song), Some(artist)) => {
            info!("Getting lyrics for {} by {}", song, artist);
            let record = lyrics
                .get_lyrics(song, artist, args.album.as_deref(), args.duration)
                .await?;
            (record, format!("{} by {}", song, artist))
        }
        _ => anyhow::bail!("Song name and artist name are required"),
    };

    match record {
        Some(record) => output::emit(record, &args.output),
        None => anyhow::bail!("No lyrics found for {}", wanted),
    }
}
