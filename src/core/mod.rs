//! Core functionality modules
//!
//! This module contains the lyrics logic organized into layers:
//! - `lyrics`: Data model and LRC/plain/JSON conversions
//! - `services`: LRCLIB client, publishing and the cache-first lyrics service
//! - `infrastructure`: JSON file caches

pub mod infrastructure;
pub mod lyrics;
pub mod services;

pub use lyrics::{LineIndex, LyricsRecord};
pub use services::LyricsService;
