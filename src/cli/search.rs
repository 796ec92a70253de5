use anyhow::Result;
use clap::Args;
use tracing::info;

use super::output::{self, OutputArgs};
use crate::core::services::SearchQuery;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct SearchArgs {
    /// Free-text query
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Song name (used when no query is given)
    #[arg(short, long)]
    song: Option<String>,

    /// Artist name
    #[arg(short, long)]
    artist: Option<String>,

    /// Album name
    #[arg(short = 'l', long)]
    album: Option<String>,

    /// Show the result at this position (1-based) instead of the list
    #[arg(short, long)]
    index: Option<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

pub async fn execute(args: SearchArgs, services: &SimpleServices) -> Result<()> {
    let query = SearchQuery {
        q: args.query.clone(),
        song_name: args.song.clone(),
        artist_name: args.artist.clone(),
        album_name: args.album.clone(),
    };
    let described = describe(&query);

    info!("Searching for lyrics...");
    let results = services.lyrics().search_lyrics(&query).await?;

    if results.is_empty() {
        anyhow::bail!("No results found for '{}'", described);
    }

    let Some(index) = args.index else {
        println!("🔍 Search results for '{}':", described);
        for (position, record) in results.iter().enumerate() {
            println!("{}", output::summary_line(position + 1, record));
        }
        println!("\n💡 Use --index N to show a result");
        return Ok(());
    };

    if index == 0 || index > results.len() {
        anyhow::bail!(
            "Search index {} out of range (1-{})",
            index,
            results.len()
        );
    }

    let record = results.into_iter().nth(index - 1);
    match record {
        Some(record) => output::emit(record, &args.output),
        None => anyhow::bail!("Search index {} out of range", index),
    }
}

fn describe(query: &SearchQuery) -> String {
    match (&query.q, &query.song_name, &query.artist_name) {
        (Some(q), _, _) if !q.is_empty() => q.clone(),
        (_, Some(song), Some(artist)) => format!("{} {}", song, artist),
        (_, Some(song), None) => song.clone(),
        _ => String::new(),
    }
}
