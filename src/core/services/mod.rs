//! External services integration
//!
//! This module contains integrations with the LRCLIB API:
//! - HTTP client for lookups, search, publishing and dump downloads
//! - Proof-of-work solver for publish tokens
//! - Database dump listing model
//! - Lyrics service combining the client with the caches

pub mod challenge;
pub mod dumps;
pub mod lrclib;
pub mod lyrics_service;

pub use challenge::{generate_publish_token, verify_nonce, Challenge};
pub use dumps::{format_file_size, DatabaseDump};
pub use lrclib::{LrclibClient, PublishRequest};
pub use lyrics_service::{normalize_name, LyricsService, SearchQuery};
