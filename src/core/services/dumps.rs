use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cache key the dump listing is stored under.
pub const DUMPS_CACHE_KEY: &str = "database_dumps";
pub const DEFAULT_DUMPS_DOWNLOAD_URL: &str = "https://db-dumps.lrclib.net";

/// One downloadable LRCLIB database dump.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseDump {
    pub storage_class: String,
    pub uploaded: DateTime<Utc>,
    pub checksums: BTreeMap<String, String>,
    pub http_etag: String,
    pub etag: String,
    pub size: u64,
    pub version: String,
    pub key: String,
}

impl DatabaseDump {
    /// Last path segment of the storage key.
    pub fn filename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    pub fn download_url(&self) -> String {
        self.download_url_from(DEFAULT_DUMPS_DOWNLOAD_URL)
    }

    pub fn download_url_from(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.filename())
    }
}

/// Listing as returned by the dumps endpoint.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DumpsListing {
    pub objects: Vec<DatabaseDump>,
    pub truncated: bool,
    pub delimited_prefixes: Vec<String>,
}

/// Listing plus the time it was fetched, in Unix seconds.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DumpsCacheEntry {
    pub timestamp: f64,
    pub objects: Vec<DatabaseDump>,
    pub truncated: bool,
    pub delimited_prefixes: Vec<String>,
}

impl DumpsCacheEntry {
    pub fn new(listing: DumpsListing, fetched_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: unix_seconds(fetched_at),
            objects: listing.objects,
            truncated: listing.truncated,
            delimited_prefixes: listing.delimited_prefixes,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_seconds: u64) -> bool {
        unix_seconds(now) - self.timestamp < ttl_seconds as f64
    }
}

/// Newest dump first.
pub fn sort_newest_first(dumps: &mut [DatabaseDump]) {
    dumps.sort_by(|a, b| b.uploaded.cmp(&a.uploaded));
}

/// Human readable size with one decimal, e.g. `"1.5 MB"`.
pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

fn unix_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const LISTING: &str = r#"{
        "objects": [
            {
                "storageClass": "Standard",
                "uploaded": "2025-01-20T08:15:00.000Z",
                "checksums": {"md5": "abc123"},
                "httpEtag": "\"etag-1\"",
                "etag": "etag-1",
                "size": 19327352832,
                "version": "v1",
                "key": "dumps/lrclib-db-dump-20250120.sqlite3.gz"
            },
            {
                "storageClass": "Standard",
                "uploaded": "2025-03-02T10:00:00.000Z",
                "size": 1024,
                "key": "lrclib-db-dump-20250302.sqlite3.gz"
            }
        ],
        "truncated": false,
        "delimitedPrefixes": []
    }"#;

    #[test]
    fn test_parse_listing() {
        let listing: DumpsListing = serde_json::from_str(LISTING).unwrap();
        assert_eq!(listing.objects.len(), 2);

        let first = &listing.objects[0];
        assert_eq!(first.storage_class, "Standard");
        assert_eq!(first.size, 19327352832);
        assert_eq!(first.checksums.get("md5").map(String::as_str), Some("abc123"));
        assert_eq!(first.uploaded, Utc.with_ymd_and_hms(2025, 1, 20, 8, 15, 0).unwrap());

        // Missing fields fall back to defaults.
        assert_eq!(listing.objects[1].etag, "");
        assert!(listing.objects[1].checksums.is_empty());
    }

    #[test]
    fn test_filename_and_download_url() {
        let listing: DumpsListing = serde_json::from_str(LISTING).unwrap();
        assert_eq!(listing.objects[0].filename(), "lrclib-db-dump-20250120.sqlite3.gz");
        assert_eq!(listing.objects[1].filename(), "lrclib-db-dump-20250302.sqlite3.gz");
        assert_eq!(
            listing.objects[0].download_url(),
            "https://db-dumps.lrclib.net/lrclib-db-dump-20250120.sqlite3.gz"
        );
        assert_eq!(
            listing.objects[1].download_url_from("http://localhost:9000/"),
            "http://localhost:9000/lrclib-db-dump-20250302.sqlite3.gz"
        );
    }

    #[test]
    fn test_sort_newest_first() {
        let mut dumps = serde_json::from_str::<DumpsListing>(LISTING).unwrap().objects;
        sort_newest_first(&mut dumps);
        assert_eq!(dumps[0].version, "");
        assert_eq!(dumps[1].version, "v1");
    }

    #[test]
    fn test_cache_entry_freshness() {
        let fetched = Utc.with_ymd_and_hms(2025, 3, 2, 12, 0, 0).unwrap();
        let entry = DumpsCacheEntry::new(DumpsListing::default(), fetched);

        assert!(entry.is_fresh(fetched + Duration::minutes(59), 3600));
        assert!(!entry.is_fresh(fetched + Duration::minutes(61), 3600));
    }

    #[test]
    fn test_cache_entry_uses_camel_case_keys() {
        let listing: DumpsListing = serde_json::from_str(LISTING).unwrap();
        let entry = DumpsCacheEntry::new(listing, Utc::now());
        let value = serde_json::to_value(&entry).unwrap();

        assert!(value.get("delimitedPrefixes").is_some());
        assert!(value["timestamp"].is_f64());
        assert_eq!(value["objects"][0]["storageClass"], "Standard");

        let back: DumpsCacheEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0.0 B");
        assert_eq!(format_file_size(1023), "1023.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_file_size(19327352832), "18.0 GB");
        assert_eq!(format_file_size(1024u64.pow(5) * 2), "2.0 PB");
    }
}
