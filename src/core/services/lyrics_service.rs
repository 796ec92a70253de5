use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::challenge::{generate_publish_token_cancellable, Challenge};
use super::dumps::{sort_newest_first, DatabaseDump, DumpsCacheEntry, DUMPS_CACHE_KEY};
use super::lrclib::{LrclibClient, PublishRequest};
use crate::config::Config;
use crate::core::infrastructure::cache::CacheSet;
use crate::core::lyrics::{LyricsPayload, LyricsRecord};
use crate::error::{LyriqError, Result};

pub const DEFAULT_DUMPS_CACHE_TTL_SECONDS: u64 = 3600;

/// Lower-case and swap `·` for `-`, the form used for cache keys and API queries.
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace('·', "-")
}

fn cache_key(artist_name: &str, track_name: &str) -> String {
    format!("{}:{}", normalize_name(artist_name), normalize_name(track_name))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Search by free text `q`, or by song name with optional artist and album.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub song_name: Option<String>,
    pub artist_name: Option<String>,
    pub album_name: Option<String>,
}

impl SearchQuery {
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Default::default()
        }
    }

    /// Search-cache key and the normalized query parameters.
    ///
    /// The album narrows the request but is not part of the key.
    pub fn cache_key_and_params(&self) -> Result<(String, Vec<(&'static str, String)>)> {
        let mut params = Vec::new();

        let key = if let Some(q) = non_empty(&self.q) {
            let q = normalize_name(q);
            params.push(("q", q.clone()));
            q
        } else {
            let song = non_empty(&self.song_name).ok_or_else(|| {
                LyriqError::Validation("Either q or song_name must be provided".to_string())
            })?;
            let song = normalize_name(song);
            params.push(("track_name", song.clone()));

            match non_empty(&self.artist_name) {
                Some(artist) => {
                    let artist = normalize_name(artist);
                    params.push(("artist_name", artist.clone()));
                    format!("{}:{}", artist, song)
                }
                None => song,
            }
        };

        if let Some(album) = non_empty(&self.album_name) {
            params.push(("album_name", normalize_name(album)));
        }
        Ok((key, params))
    }
}

/// Cache-first access to lyrics, publishing and database dumps.
pub struct LyricsService {
    client: LrclibClient,
    caches: Arc<CacheSet>,
    cache_dir: PathBuf,
    none_char: String,
    dumps_cache_ttl_seconds: u64,
}

impl LyricsService {
    pub fn new(
        client: LrclibClient,
        caches: Arc<CacheSet>,
        cache_dir: impl Into<PathBuf>,
        none_char: impl Into<String>,
    ) -> Self {
        Self {
            client,
            caches,
            cache_dir: cache_dir.into(),
            none_char: none_char.into(),
            dumps_cache_ttl_seconds: DEFAULT_DUMPS_CACHE_TTL_SECONDS,
        }
    }

    pub fn with_dumps_cache_ttl(mut self, seconds: u64) -> Self {
        self.dumps_cache_ttl_seconds = seconds;
        self
    }

    /// Open the caches under the configured directory and build the client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let caches = Arc::new(CacheSet::open(&config.cache_dir)?);
        let client = LrclibClient::from_config(config)?;
        Ok(Self::new(client, caches, &config.cache_dir, &config.none_char)
            .with_dumps_cache_ttl(config.dumps_cache_ttl_seconds))
    }

    pub fn caches(&self) -> &CacheSet {
        &self.caches
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn record(&self, payload: LyricsPayload) -> LyricsRecord {
        LyricsRecord::from_payload(payload, &self.none_char)
    }

    /// Lyrics for an exact song/artist pair. `Ok(None)` when LRCLIB has no such track.
    pub async fn get_lyrics(
        &self,
        song_name: &str,
        artist_name: &str,
        album_name: Option<&str>,
        duration: Option<f64>,
    ) -> Result<Option<LyricsRecord>> {
        let key = cache_key(artist_name, song_name);
        if let Some(payload) = self.caches.lyrics.get(&key) {
            debug!("Using cached lyrics for {}", key);
            return Ok(Some(self.record(payload)));
        }

        let album = album_name.map(normalize_name);
        let result = self
            .client
            .get_lyrics(
                &normalize_name(song_name),
                &normalize_name(artist_name),
                album.as_deref(),
                duration,
            )
            .await;

        match result {
            Ok(payload) => {
                self.caches.lyrics.set(key, payload.clone());
                Ok(Some(self.record(payload)))
            }
            Err(e) if e.is_not_found() => {
                info!("No lyrics found for: {} - {}", artist_name, song_name);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Lyrics by LRCLIB id, checking cached payloads first.
    pub async fn get_lyrics_by_id(&self, lyrics_id: &str) -> Result<Option<LyricsRecord>> {
        if let Some(payload) = self.caches.lyrics.get_by_lyrics_id(lyrics_id) {
            debug!("Using cached lyrics for id {}", lyrics_id);
            return Ok(Some(self.record(payload)));
        }

        match self.client.get_lyrics_by_id(lyrics_id).await {
            Ok(payload) => {
                let key = cache_key(&payload.artist_name, &payload.track_name);
                self.caches.lyrics.set(key, payload.clone());
                Ok(Some(self.record(payload)))
            }
            Err(e) if e.is_not_found() => {
                info!("No lyrics found for id {}", lyrics_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Search results, one per distinct artist/track pair, in API order.
    pub async fn search_lyrics(&self, query: &SearchQuery) -> Result<Vec<LyricsRecord>> {
        let (key, params) = query.cache_key_and_params()?;

        if let Some(cached) = self.cached_search(&key) {
            debug!("Using cached search results for {}", key);
            return Ok(cached.into_iter().map(|payload| self.record(payload)).collect());
        }

        let results = self.client.search(&params).await?;

        let mut seen = BTreeMap::new();
        let mut unique = Vec::new();
        for payload in results {
            let lyrics_key = cache_key(&payload.artist_name, &payload.track_name);
            if seen.contains_key(&lyrics_key) {
                continue;
            }
            seen.insert(lyrics_key, payload.clone());
            unique.push(payload);
        }

        let added = self.caches.lyrics.update(seen);
        debug!("Search for {} added {} new cache entries", key, added);

        let ids: Vec<String> = unique
            .iter()
            .filter(|payload| !payload.id.is_empty())
            .map(|payload| payload.id.clone())
            .collect();
        self.caches.search.set(key, ids);

        Ok(unique.into_iter().map(|payload| self.record(payload)).collect())
    }

    // A hit only counts when every stored id still resolves in the lyrics cache.
    fn cached_search(&self, key: &str) -> Option<Vec<LyricsPayload>> {
        let ids = self.caches.search.get(key)?;
        if ids.is_empty() {
            return None;
        }

        let mut by_id: HashMap<String, LyricsPayload> = self
            .caches
            .lyrics
            .get_bulk_by_lyrics_id(&ids)
            .into_iter()
            .map(|payload| (payload.id.clone(), payload))
            .collect();

        ids.iter().map(|id| by_id.remove(id)).collect()
    }

    pub async fn request_challenge(&self) -> Result<Challenge> {
        self.client.request_challenge().await
    }

    /// Solve a publish challenge and submit the lyrics.
    pub async fn publish_lyrics(&self, request: &PublishRequest) -> Result<bool> {
        self.publish_lyrics_cancellable(request, Arc::new(AtomicBool::new(false)))
            .await
    }

    /// Like [`LyricsService::publish_lyrics`], stopping the proof of work once `cancel` is set.
    pub async fn publish_lyrics_cancellable(
        &self,
        request: &PublishRequest,
        cancel: Arc<AtomicBool>,
    ) -> Result<bool> {
        let challenge = self.client.request_challenge().await?;
        debug!("Solving publish challenge with prefix {}", challenge.prefix);

        let token = tokio::task::spawn_blocking(move || {
            generate_publish_token_cancellable(&challenge.prefix, &challenge.target, &cancel)
        })
        .await??;

        self.client.publish(&token, request).await
    }

    /// Available database dumps, served from cache while the listing is fresh.
    pub async fn get_database_dumps(&self) -> Result<Vec<DatabaseDump>> {
        if let Some(entry) = self.caches.dumps.get(DUMPS_CACHE_KEY) {
            if entry.is_fresh(Utc::now(), self.dumps_cache_ttl_seconds) {
                debug!("Using cached database dump listing");
                return Ok(entry.objects);
            }
        }

        let listing = self.client.get_database_dumps().await?;
        if listing.truncated {
            warn!("Database dump listing is truncated");
        }
        let entry = DumpsCacheEntry::new(listing, Utc::now());
        let dumps = entry.objects.clone();
        self.caches.dumps.set(DUMPS_CACHE_KEY, entry);
        Ok(dumps)
    }

    /// Most recently uploaded dump, if any.
    pub async fn get_latest_database_dump(&self) -> Result<Option<DatabaseDump>> {
        let mut dumps = self.get_database_dumps().await?;
        sort_newest_first(&mut dumps);
        Ok(dumps.into_iter().next())
    }

    /// Download `dump` to `destination`, or into the cache directory under its own filename.
    pub async fn download_database_dump<F>(
        &self,
        dump: &DatabaseDump,
        destination: Option<&Path>,
        progress: F,
    ) -> Result<PathBuf>
    where
        F: FnMut(u64, u64),
    {
        let path = match destination {
            Some(path) => path.to_path_buf(),
            None => self.cache_dir.join(dump.filename()),
        };
        let url = dump.download_url_from(self.client.dumps_download_url());

        info!("Downloading {} to {}", url, path.display());
        self.client.download_file(&url, &path, progress).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::lrclib::test_server::{serve, CannedResponse};
    use std::time::Duration;
    use tempfile::TempDir;

    fn payload_json(id: u64, track: &str, artist: &str) -> String {
        format!(
            r#"{{"id":{},"name":"{}","trackName":"{}","artistName":"{}","albumName":"Album","duration":200,"instrumental":false,"plainLyrics":"Hello\nWorld","syncedLyrics":"[00:01.00]Hello\n[00:02.00]World"}}"#,
            id, track, track, artist
        )
    }

    fn service(base_url: &str) -> (LyricsService, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let client = LrclibClient::new(
            &format!("{}/api", base_url),
            &format!("{}/dumps", base_url),
            base_url,
            Duration::from_secs(5),
        )
        .unwrap();
        let caches = Arc::new(CacheSet::open(dir.path()).unwrap());
        (LyricsService::new(client, caches, dir.path(), "♪"), dir)
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Post Malone"), "post malone");
        assert_eq!(normalize_name("Ty·Dolla"), "ty-dolla");
    }

    #[test]
    fn test_search_key_from_text() {
        let query = SearchQuery {
            q: Some("Circles Post Malone".to_string()),
            album_name: Some("Hollywood's Bleeding".to_string()),
            ..Default::default()
        };
        let (key, params) = query.cache_key_and_params().unwrap();
        assert_eq!(key, "circles post malone");
        assert_eq!(
            params,
            vec![
                ("q", "circles post malone".to_string()),
                ("album_name", "hollywood's bleeding".to_string())
            ]
        );
    }

    #[test]
    fn test_search_key_from_song_and_artist() {
        let query = SearchQuery {
            song_name: Some("Circles".to_string()),
            artist_name: Some("Post Malone".to_string()),
            ..Default::default()
        };
        assert_eq!(query.cache_key_and_params().unwrap().0, "post malone:circles");

        let song_only = SearchQuery {
            song_name: Some("Circles".to_string()),
            ..Default::default()
        };
        assert_eq!(song_only.cache_key_and_params().unwrap().0, "circles");
    }

    #[test]
    fn test_search_key_requires_text_or_song() {
        let query = SearchQuery {
            artist_name: Some("Post Malone".to_string()),
            q: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(
            query.cache_key_and_params(),
            Err(LyriqError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_lyrics_fetches_then_caches() {
        let (base_url, mut requests) =
            serve(vec![CannedResponse::json(200, &payload_json(7, "Song", "Artist"))]).await;
        let (service, _dir) = service(&base_url);

        let record = service
            .get_lyrics("Song", "Artist", None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.id, "7");
        assert!(record.has_synced());

        let request = requests.recv().await.unwrap();
        assert!(request.contains("track_name=song"));
        assert!(service.caches().lyrics.contains_key("artist:song"));

        // Served from cache; the server has no responses left.
        let again = service
            .get_lyrics("SONG", "ARTIST", None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again, record);
    }

    #[tokio::test]
    async fn test_get_lyrics_not_found_is_none() {
        let (base_url, _requests) = serve(vec![CannedResponse::json(
            404,
            r#"{"statusCode":404,"name":"TrackNotFound","message":"Failed to find specified track"}"#,
        )])
        .await;
        let (service, _dir) = service(&base_url);

        assert!(service
            .get_lyrics("Nothing", "Nobody", Some("None"), Some(10.0))
            .await
            .unwrap()
            .is_none());
        assert!(service.caches().lyrics.is_empty());
    }

    #[tokio::test]
    async fn test_get_lyrics_other_api_errors_surface() {
        let (base_url, _requests) = serve(vec![CannedResponse::json(
            500,
            r#"{"statusCode":500,"name":"UnknownError","message":"Something bad happened"}"#,
        )])
        .await;
        let (service, _dir) = service(&base_url);

        let error = service.get_lyrics("Song", "Artist", None, None).await.unwrap_err();
        assert!(matches!(error, LyriqError::Api { code: 500, .. }));
    }

    #[tokio::test]
    async fn test_get_lyrics_by_id_uses_cache_then_api() {
        let (base_url, mut requests) =
            serve(vec![CannedResponse::json(200, &payload_json(9, "Other", "Band"))]).await;
        let (service, _dir) = service(&base_url);

        let cached: LyricsPayload =
            serde_json::from_str(&payload_json(3, "Cached", "Artist")).unwrap();
        service.caches().lyrics.set("artist:cached", cached);

        let record = service.get_lyrics_by_id("3").await.unwrap().unwrap();
        assert_eq!(record.track_name, "Cached");

        let record = service.get_lyrics_by_id("9").await.unwrap().unwrap();
        assert_eq!(record.track_name, "Other");
        assert!(requests.recv().await.unwrap().starts_with("GET /api/get/9 "));
        assert!(service.caches().lyrics.contains_key("band:other"));
    }

    #[tokio::test]
    async fn test_search_dedupes_and_caches() {
        let body = format!(
            "[{},{},{}]",
            payload_json(1, "Song", "Artist"),
            payload_json(2, "song", "ARTIST"),
            payload_json(3, "Song (Live)", "Artist")
        );
        let (base_url, _requests) = serve(vec![CannedResponse::json(200, &body)]).await;
        let (service, _dir) = service(&base_url);

        let results = service
            .search_lyrics(&SearchQuery::text("Artist Song"))
            .await
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(
            service.caches().search.get("artist song"),
            Some(vec!["1".to_string(), "3".to_string()])
        );

        // Second search is answered locally, in the stored order.
        let again = service
            .search_lyrics(&SearchQuery::text("ARTIST SONG"))
            .await
            .unwrap();
        let ids: Vec<&str> = again.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[tokio::test]
    async fn test_search_merge_keeps_existing_lyrics() {
        let body = format!("[{}]", payload_json(5, "Song", "Artist"));
        let (base_url, _requests) = serve(vec![CannedResponse::json(200, &body)]).await;
        let (service, _dir) = service(&base_url);

        let existing: LyricsPayload = serde_json::from_str(&payload_json(4, "Song", "Artist")).unwrap();
        service.caches().lyrics.set("artist:song", existing);

        service.search_lyrics(&SearchQuery::text("song")).await.unwrap();
        assert_eq!(service.caches().lyrics.get("artist:song").unwrap().id, "4");
    }

    #[tokio::test]
    async fn test_publish_solves_challenge() {
        let target = "F".repeat(64);
        let (base_url, mut requests) = serve(vec![
            CannedResponse::json(200, &format!(r#"{{"prefix":"pfx","target":"{}"}}"#, target)),
            CannedResponse::json(201, ""),
        ])
        .await;
        let (service, _dir) = service(&base_url);

        let request = PublishRequest {
            track_name: "Song".to_string(),
            artist_name: "Artist".to_string(),
            album_name: "Album".to_string(),
            duration: 200.0,
            plain_lyrics: "Hello".to_string(),
            synced_lyrics: "[00:01.00]Hello".to_string(),
        };
        assert!(service.publish_lyrics(&request).await.unwrap());

        let _challenge_request = requests.recv().await.unwrap();
        let publish_request = requests.recv().await.unwrap();
        assert!(publish_request.to_lowercase().contains("x-publish-token: pfx:0"));
    }

    #[tokio::test]
    async fn test_publish_cancelled_before_solution() {
        let target = "0".repeat(64);
        let (base_url, _requests) = serve(vec![CannedResponse::json(
            200,
            &format!(r#"{{"prefix":"pfx","target":"{}"}}"#, target),
        )])
        .await;
        let (service, _dir) = service(&base_url);

        let request = PublishRequest {
            track_name: "Song".to_string(),
            artist_name: "Artist".to_string(),
            album_name: "Album".to_string(),
            duration: 200.0,
            plain_lyrics: "Hello".to_string(),
            synced_lyrics: String::new(),
        };
        let result = service
            .publish_lyrics_cancellable(&request, Arc::new(AtomicBool::new(true)))
            .await;
        assert!(matches!(result, Err(LyriqError::Cancelled)));
    }

    const DUMPS: &str = r#"{
        "objects": [
            {"uploaded": "2025-01-01T00:00:00.000Z", "size": 10, "key": "old.sqlite3.gz"},
            {"uploaded": "2025-02-01T00:00:00.000Z", "size": 12, "key": "new.sqlite3.gz"}
        ],
        "truncated": false,
        "delimitedPrefixes": []
    }"#;

    #[tokio::test]
    async fn test_database_dumps_are_cached() {
        let (base_url, mut requests) = serve(vec![CannedResponse::json(200, DUMPS)]).await;
        let (service, _dir) = service(&base_url);

        assert_eq!(service.get_database_dumps().await.unwrap().len(), 2);
        assert!(requests.recv().await.unwrap().starts_with("GET /dumps "));

        // Fresh listing comes from the cache.
        let latest = service.get_latest_database_dump().await.unwrap().unwrap();
        assert_eq!(latest.key, "new.sqlite3.gz");
    }

    #[tokio::test]
    async fn test_stale_dump_listing_is_refetched() {
        let (base_url, _requests) = serve(vec![CannedResponse::json(200, DUMPS)]).await;
        let (service, _dir) = service(&base_url);

        let stale = DumpsCacheEntry {
            timestamp: 0.0,
            ..Default::default()
        };
        service.caches().dumps.set(DUMPS_CACHE_KEY, stale);

        assert_eq!(service.get_database_dumps().await.unwrap().len(), 2);
        assert!(service.caches().dumps.get(DUMPS_CACHE_KEY).unwrap().timestamp > 0.0);
    }

    #[tokio::test]
    async fn test_download_database_dump_defaults_to_cache_dir() {
        let (base_url, mut requests) = serve(vec![CannedResponse::json(200, "dump-bytes")]).await;
        let (service, dir) = service(&base_url);

        let dump: DatabaseDump =
            serde_json::from_str(r#"{"key": "dumps/new.sqlite3.gz", "size": 10}"#).unwrap();
        let path = service
            .download_database_dump(&dump, None, |_, _| {})
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("new.sqlite3.gz"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "dump-bytes");
        assert!(requests.recv().await.unwrap().starts_with("GET /new.sqlite3.gz "));
    }
}
