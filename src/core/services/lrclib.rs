//! HTTP client for the LRCLIB API and its database dumps.

use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::challenge::Challenge;
use super::dumps::DumpsListing;
use crate::config::Config;
use crate::core::lyrics::LyricsPayload;
use crate::error::{LyriqError, Result};

pub const DEFAULT_API_URL: &str = "https://lrclib.net/api";
pub const DEFAULT_DUMPS_URL: &str = "https://lrclib-db-dumps.bu3nnyut4y9jfkdg.workers.dev";
pub const PUBLISH_TOKEN_HEADER: &str = "X-Publish-Token";

const MAX_ATTEMPTS: u32 = 3;

/// Body sent to `POST /publish`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration: f64,
    pub plain_lyrics: String,
    pub synced_lyrics: String,
}

/// Error body LRCLIB sends with non-2xx responses.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct ApiErrorBody {
    status_code: Option<u16>,
    name: Option<String>,
    message: Option<String>,
}

/// HTTP access to the LRCLIB API and its database dump listing.
///
/// Only transport failures are retried. Any response the server actually
/// sent, error or not, is returned to the caller as is.
#[derive(Clone)]
pub struct LrclibClient {
    client: Client,
    api_url: String,
    dumps_url: String,
    dumps_download_url: String,
}

impl LrclibClient {
    pub fn new(
        api_url: &str,
        dumps_url: &str,
        dumps_download_url: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let user_agent = format!(
            "Lyriq v{} ({})",
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_REPOSITORY")
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            dumps_url: dumps_url.to_string(),
            dumps_download_url: dumps_download_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.api_url,
            &config.dumps_url,
            &config.dumps_download_url,
            Duration::from_secs(config.request_timeout_seconds),
        )
    }

    pub fn dumps_download_url(&self) -> &str {
        &self.dumps_download_url
    }

    /// `GET /get` with exact track metadata.
    pub async fn get_lyrics(
        &self,
        track_name: &str,
        artist_name: &str,
        album_name: Option<&str>,
        duration: Option<f64>,
    ) -> Result<LyricsPayload> {
        let mut params = vec![
            ("track_name", track_name.to_string()),
            ("artist_name", artist_name.to_string()),
        ];
        if let Some(album) = album_name.filter(|album| !album.is_empty()) {
            params.push(("album_name", album.to_string()));
        }
        if let Some(duration) = duration.filter(|duration| *duration > 0.0) {
            params.push(("duration", duration.round().to_string()));
        }

        debug!("Getting lyrics from LRCLIB API for: {} - {}", artist_name, track_name);
        let url = format!("{}/get", self.api_url);
        self.get_json(|| self.client.get(&url).query(&params)).await
    }

    /// `GET /get/{id}`.
    pub async fn get_lyrics_by_id(&self, lyrics_id: &str) -> Result<LyricsPayload> {
        debug!("Getting lyrics from LRCLIB API for id {}", lyrics_id);
        let url = format!("{}/get/{}", self.api_url, lyrics_id);
        self.get_json(|| self.client.get(&url)).await
    }

    /// `GET /search` with already normalized parameters.
    pub async fn search(&self, params: &[(&str, String)]) -> Result<Vec<LyricsPayload>> {
        info!("Searching LRCLIB API with params: {:?}", params);
        let url = format!("{}/search", self.api_url);
        self.get_json(|| self.client.get(&url).query(params)).await
    }

    /// `POST /request-challenge`.
    pub async fn request_challenge(&self) -> Result<Challenge> {
        let url = format!("{}/request-challenge", self.api_url);
        self.get_json(|| {
            self.client
                .post(&url)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
        })
        .await
    }

    /// `POST /publish` with a solved token. `Ok(false)` for a 2xx that is not 201.
    pub async fn publish(&self, publish_token: &str, request: &PublishRequest) -> Result<bool> {
        let url = format!("{}/publish", self.api_url);
        let response = self
            .send_with_retry(|| {
                self.client
                    .post(&url)
                    .header(PUBLISH_TOKEN_HEADER, publish_token)
                    .json(request)
            })
            .await?;
        let response = error_for_status(response).await?;

        if response.status() == StatusCode::CREATED {
            info!(
                "Published lyrics for {} by {}",
                request.track_name, request.artist_name
            );
            Ok(true)
        } else {
            warn!("Failed to publish lyrics: {}", response.status());
            Ok(false)
        }
    }

    /// Listing of the available database dumps.
    pub async fn get_database_dumps(&self) -> Result<DumpsListing> {
        debug!("Fetching database dump listing from {}", self.dumps_url);
        self.get_json(|| self.client.get(&self.dumps_url)).await
    }

    /// Stream `url` into `destination`, reporting `(downloaded, total)` after
    /// every chunk. `total` is 0 when the server sends no length.
    pub async fn download_file<F>(&self, url: &str, destination: &Path, mut progress: F) -> Result<u64>
    where
        F: FnMut(u64, u64),
    {
        let response = self.send_with_retry(|| self.client.get(url)).await?;
        if !response.status().is_success() {
            return Err(download_error(response).await);
        }

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let total = response.content_length().unwrap_or(0);
        let mut file = tokio::fs::File::create(destination).await?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            progress(downloaded, total);
        }
        file.flush().await?;

        info!("Downloaded {} bytes to {}", downloaded, destination.display());
        Ok(downloaded)
    }

    async fn get_json<T, B>(&self, build: B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Fn() -> RequestBuilder,
    {
        let response = self.send_with_retry(build).await?;
        let response = error_for_status(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_with_retry<B>(&self, build: B) -> Result<Response>
    where
        B: Fn() -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < MAX_ATTEMPTS && is_transient(&e) => {
                    let backoff = 2u64.pow(attempt - 1) * 300; // 300ms, 600ms
                    debug!("Request failed ({}), retrying in {}ms", e, backoff);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

/// Pass 2xx responses through; turn anything else into `Api` from its JSON body.
async fn error_for_status(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await?;
    let error: ApiErrorBody = serde_json::from_str(&body)?;
    Err(api_error(status, error))
}

// The dump CDN answers with plain text or HTML on failure, not LRCLIB's JSON.
async fn download_error(response: Response) -> LyriqError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = serde_json::from_str::<ApiErrorBody>(&body).unwrap_or_else(|_| ApiErrorBody {
        name: status.canonical_reason().map(str::to_string),
        message: Some("Failed to download database dump".to_string()),
        ..Default::default()
    });
    api_error(status, error)
}

fn api_error(status: StatusCode, error: ApiErrorBody) -> LyriqError {
    LyriqError::Api {
        code: error.status_code.unwrap_or(status.as_u16()),
        name: error.name.unwrap_or_else(|| "Unknown error".to_string()),
        message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! Minimal HTTP/1.1 server answering each connection with the next canned response.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    pub struct CannedResponse {
        pub status: u16,
        pub body: String,
    }

    impl CannedResponse {
        pub fn json(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
            }
        }
    }

    /// Raw request text (head and body) as the server received it.
    pub type RecordedRequests = mpsc::UnboundedReceiver<String>;

    /// Start serving `responses` in order. Returns the base URL and the received requests.
    pub async fn serve(responses: Vec<CannedResponse>) -> (String, RecordedRequests) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for canned in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut socket).await;
                let _ = sender.send(request);

                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    canned.status,
                    canned.body.len(),
                    canned.body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", address), receiver)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let read = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(read) => read,
            };
            buffer.extend_from_slice(&chunk[..read]);

            let text = String::from_utf8_lossy(&buffer);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let body_len = content_length(&text[..head_end]);
                if buffer.len() >= head_end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }
}
