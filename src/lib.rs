//! lyriq: LRCLIB lyrics lookup, LRC/plain conversion, a disk-backed JSON
//! cache, publish-token proof of work and database dump downloads.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod signal_handler;
pub mod utils;

pub use crate::config::Config;
pub use crate::core::lyrics::{LineIndex, LyricsRecord, DEFAULT_NONE_CHAR};
pub use crate::core::services::{
    generate_publish_token, verify_nonce, LrclibClient, LyricsService, PublishRequest, SearchQuery,
};
pub use crate::error::{LyriqError, Result};
pub use crate::services::SimpleServices;
