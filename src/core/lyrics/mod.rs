//! Lyrics data model and format codec
//!
//! - `timestamp`: LRC timestamp tokens to and from seconds
//! - `index`: the ordered timestamp → line mapping derived from raw texts
//! - `record`: `LyricsRecord`, the API payload shape and the JSON export
//! - `lrc`: LRC and plain-text conversions

pub mod index;
pub mod lrc;
pub mod record;
pub mod timestamp;

pub use index::{LineIndex, TimedLine, DEFAULT_NONE_CHAR};
pub use lrc::to_plain_lyrics;
pub use record::{LyricsExport, LyricsPayload, LyricsRecord};
