use clap::{Parser, Subcommand};

use lyriq::cli::{cache, dumps, get, load, publish, search};
use lyriq::config::Config;
use lyriq::error::Result;
use lyriq::services::SimpleServices;
use lyriq::utils;

#[derive(Parser)]
#[command(name = "lyriq")]
#[command(about = "Fetch, convert and publish synced lyrics via LRCLIB")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Disable logging output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Config file path (optional)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get lyrics for a song
    Get(get::GetArgs),

    /// Search LRCLIB for lyrics
    Search(search::SearchArgs),

    /// Load lyrics from an LRC or JSON file
    Load(load::LoadArgs),

    /// Publish lyrics from a file to LRCLIB
    Publish(publish::PublishArgs),

    /// List or download LRCLIB database dumps
    Dumps(dumps::DumpsArgs),

    /// Show cache location and entry counts
    Cache(cache::CacheArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    utils::logging::init_logging(cli.verbose, cli.quiet)?;

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize services
    let services = SimpleServices::new(config)?;

    let result = match cli.command {
        Commands::Get(args) => get::execute(args, &services).await,
        Commands::Search(args) => search::execute(args, &services).await,
        Commands::Load(args) => load::execute(args, &services).await,
        Commands::Publish(args) => publish::execute(args, &services).await,
        Commands::Dumps(args) => dumps::execute(args, &services).await,
        Commands::Cache(args) => cache::execute(args, &services).await,
    };

    services.lyrics().caches().flush();
    Ok(result?)
}
