use anyhow::Result;
use clap::Args;

use crate::core::infrastructure::CacheSet;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct CacheArgs {}

pub async fn execute(_args: CacheArgs, services: &SimpleServices) -> Result<()> {
    let lyrics = services.lyrics();
    print!("{}", cache_report(&lyrics.cache_dir().display().to_string(), lyrics.caches()));
    Ok(())
}

fn cache_report(cache_dir: &str, caches: &CacheSet) -> String {
    let mut report = String::from("📊 Cache Statistics\n");
    report.push_str("══════════════════\n");
    report.push_str(&format!("📁 Directory: {}\n", cache_dir));
    report.push_str(&format!("🎵 Lyrics: {}\n", caches.lyrics.len()));
    report.push_str(&format!("🔍 Searches: {}\n", caches.search.len()));
    report.push_str(&format!("💾 Dump listings: {}\n", caches.dumps.len()));
    report
}
