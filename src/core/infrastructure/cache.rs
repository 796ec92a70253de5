//! JSON file caches with a background writer per file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

use crate::core::lyrics::LyricsPayload;
use crate::core::services::dumps::DumpsCacheEntry;
use crate::error::Result;

pub const LYRICS_CACHE_FILE: &str = "lyrics.json";
pub const SEARCH_CACHE_FILE: &str = "search.json";
pub const DB_DUMPS_CACHE_FILE: &str = "db_dumps.json";

/// Track lookups keyed by `"artist:track"`.
pub type LyricsCache = JsonCache<LyricsPayload>;
/// Search keys to the ids of their results.
pub type SearchCache = JsonCache<Vec<String>>;
/// Database dump listings.
pub type DumpsCache = JsonCache<DumpsCacheEntry>;

enum WriterMessage<V> {
    Snapshot(BTreeMap<String, V>),
    Flush(Sender<()>),
}

/// Key → value store mirrored to a single JSON file.
///
/// Reads and writes go through one lock. Every mutation hands a snapshot of
/// the whole map to a background writer that rewrites the file; queued
/// snapshots are coalesced so only the newest one hits the disk. Write
/// failures are logged and otherwise ignored.
pub struct JsonCache<V> {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, V>>,
    writer: Option<Sender<WriterMessage<V>>>,
    handle: Option<JoinHandle<()>>,
}

impl<V> JsonCache<V>
where
    V: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Open the cache at `path`, loading whatever the file holds.
    ///
    /// A missing file is an empty cache. So is an unreadable or corrupt one,
    /// after logging the problem.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = load_entries(&path);

        let (sender, receiver) = mpsc::channel();
        let writer_path = path.clone();
        let handle = thread::Builder::new()
            .name("lyriq-cache-writer".to_string())
            .spawn(move || run_writer(writer_path, receiver))?;

        debug!("Opened cache {} with {} entries", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
            writer: Some(sender),
            handle: Some(handle),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Insert or replace `key`, then schedule a rewrite of the file.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let mut entries = self.lock();
        entries.insert(key.into(), value);
        self.schedule_write(&entries);
    }

    /// Merge `data`, keeping existing entries untouched. Returns how many keys were added.
    pub fn update<I>(&self, data: I) -> usize
    where
        I: IntoIterator<Item = (String, V)>,
    {
        let mut entries = self.lock();
        let mut added = 0;
        for (key, value) in data {
            if !entries.contains_key(&key) {
                entries.insert(key, value);
                added += 1;
            }
        }
        if added > 0 {
            self.schedule_write(&entries);
        }
        added
    }

    /// Block until every snapshot scheduled so far has been written.
    pub fn flush(&self) {
        let Some(writer) = &self.writer else {
            return;
        };
        let (ack_sender, ack_receiver) = mpsc::channel();
        if writer.send(WriterMessage::Flush(ack_sender)).is_err() {
            warn!("Cache writer for {} is gone; nothing to flush", self.path.display());
            return;
        }
        let _ = ack_receiver.recv();
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, V>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Called with the lock held so snapshots reach the writer in mutation order.
    fn schedule_write(&self, entries: &BTreeMap<String, V>) {
        if let Some(writer) = &self.writer {
            if writer.send(WriterMessage::Snapshot(entries.clone())).is_err() {
                warn!("Cache writer for {} is gone; change kept in memory only", self.path.display());
            }
        }
    }
}

impl<V> Drop for JsonCache<V> {
    fn drop(&mut self) {
        // Closing the channel lets the writer drain what is queued and exit.
        self.writer.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Cache writer for {} panicked", self.path.display());
            }
        }
    }
}

impl LyricsCache {
    /// First cached payload whose `id` matches.
    pub fn get_by_lyrics_id(&self, lyrics_id: &str) -> Option<LyricsPayload> {
        self.lock()
            .values()
            .find(|payload| payload.id == lyrics_id)
            .cloned()
    }

    /// Every cached payload whose `id` is in `lyrics_ids`.
    pub fn get_bulk_by_lyrics_id(&self, lyrics_ids: &[String]) -> Vec<LyricsPayload> {
        self.lock()
            .values()
            .filter(|payload| lyrics_ids.contains(&payload.id))
            .cloned()
            .collect()
    }
}

/// The three caches the application keeps, one file each under `dir`.
pub struct CacheSet {
    pub lyrics: LyricsCache,
    pub search: SearchCache,
    pub dumps: DumpsCache,
}

impl CacheSet {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        Ok(Self {
            lyrics: JsonCache::open(dir.join(LYRICS_CACHE_FILE))?,
            search: JsonCache::open(dir.join(SEARCH_CACHE_FILE))?,
            dumps: JsonCache::open(dir.join(DB_DUMPS_CACHE_FILE))?,
        })
    }

    pub fn flush(&self) {
        self.lyrics.flush();
        self.search.flush();
        self.dumps.flush();
    }
}

fn load_entries<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    if !path.exists() {
        return BTreeMap::new();
    }

    let loaded = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));

    match loaded {
        Ok(entries) => entries,
        Err(e) => {
            error!("Error loading cache {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

fn run_writer<V: Serialize>(path: PathBuf, receiver: Receiver<WriterMessage<V>>) {
    while let Ok(message) = receiver.recv() {
        let mut pending = None;
        let mut acks = Vec::new();

        match message {
            WriterMessage::Snapshot(snapshot) => pending = Some(snapshot),
            WriterMessage::Flush(ack) => acks.push(ack),
        }

        // Coalesce whatever else is already queued.
        while let Ok(message) = receiver.try_recv() {
            match message {
                WriterMessage::Snapshot(snapshot) => pending = Some(snapshot),
                WriterMessage::Flush(ack) => acks.push(ack),
            }
        }

        if let Some(snapshot) = pending {
            if let Err(e) = write_snapshot(&path, &snapshot) {
                error!("Error writing cache {}: {}", path.display(), e);
            }
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
}

fn write_snapshot<V: Serialize>(path: &Path, snapshot: &BTreeMap<String, V>) -> Result<()> {
    let content = serde_json::to_string(snapshot)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // Write to a sibling temp file then rename so readers never see half a file.
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
