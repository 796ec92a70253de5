use std::sync::Arc;
use crate::config::Config;
use crate::core::services::LyricsService;
use crate::error::Result;

/// Process-wide context built once at startup and handed to every command.
pub struct SimpleServices {
    config: Arc<Config>,
    lyrics: Arc<LyricsService>,
}

impl SimpleServices {
    pub fn new(config: Config) -> Result<Self> {
        let lyrics = LyricsService::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            lyrics: Arc::new(lyrics),
        })
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn lyrics(&self) -> Arc<LyricsService> {
        self.lyrics.clone()
    }
}
