//! Infrastructure and cross-cutting concerns
//!
//! Disk-backed JSON caches for lookups, searches and dump listings.

pub mod cache;

pub use cache::{CacheSet, DumpsCache, JsonCache, LyricsCache, SearchCache};
