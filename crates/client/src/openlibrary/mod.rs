//! Open Library cover lookup client.
//!
//! ### Endpoints
//!
//! - **Search**: `GET {search_base}/search.json?q=<query>&limit=5&fields=cover_i`
//! - **Cover**: `GET {covers_base}/b/id/<cover_i>-M.jpg?default=false` (404 when absent)
//!
//! ### Deadlines
//!
//! Each call carries its own deadline (5s by default). When it elapses the
//! in-flight request is dropped and the call fails with [`LookupError::Timeout`].

pub mod error;
pub mod request;
pub mod response;

pub use error::LookupError;
pub use request::{SearchRequest, clean_search_term};
pub use response::{SearchDoc, SearchResponse};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lectio_core::AppConfig;
use reqwest::{Url, header};

/// Default search API base URL.
const DEFAULT_SEARCH_BASE_URL: &str = "https://openlibrary.org";

/// Default covers API base URL.
const DEFAULT_COVERS_BASE_URL: &str = "https://covers.openlibrary.org";

/// Default per-call deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "lectio/0.1";

/// Size variant requested from the covers API.
const COVER_SIZE: &str = "M";

/// External search-and-fetch source of cover images.
///
/// The resolver talks to this trait so tests can count calls and script
/// failures without a network.
#[async_trait]
pub trait CoverSource: Send + Sync {
    /// Run a search and return the candidate list in API order.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, LookupError>;

    /// Download the raw image for a cover id.
    async fn fetch_cover(&self, cover_id: u64) -> Result<Bytes, LookupError>;
}

/// Open Library client configuration.
#[derive(Debug, Clone)]
pub struct OpenLibraryConfig {
    /// Search API base URL (default: https://openlibrary.org).
    pub search_base_url: String,
    /// Covers API base URL (default: https://covers.openlibrary.org).
    pub covers_base_url: String,
    /// Deadline applied to each call independently (default: 5s).
    pub timeout: Duration,
    /// User-agent string (default: lectio/0.x).
    pub user_agent: String,
    /// Maximum accepted image size in bytes (default: 5MB).
    pub max_image_bytes: usize,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            covers_base_url: DEFAULT_COVERS_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

impl From<&AppConfig> for OpenLibraryConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            search_base_url: config.search_base_url.clone(),
            covers_base_url: config.covers_base_url.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            max_image_bytes: config.max_image_bytes,
        }
    }
}

/// Open Library HTTP client.
#[derive(Debug, Clone)]
pub struct OpenLibraryClient {
    http: reqwest::Client,
    config: OpenLibraryConfig,
    search_url: Url,
    covers_base: Url,
}

fn parse_base(base: &str) -> Result<Url, LookupError> {
    let mut url = Url::parse(base).map_err(|e| LookupError::Parse(format!("invalid base URL {base}: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

impl OpenLibraryClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OpenLibraryConfig) -> Result<Self, LookupError> {
        let search_url = parse_base(&config.search_base_url)?
            .join("search.json")
            .map_err(|e| LookupError::Parse(e.to_string()))?;
        let covers_base = parse_base(&config.covers_base_url)?;

        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| LookupError::Network(Arc::new(e)))?;

        Ok(Self { http, config, search_url, covers_base })
    }

    /// URL of the medium-size image for a cover id.
    pub fn cover_url(&self, cover_id: u64) -> Result<Url, LookupError> {
        let mut url = self
            .covers_base
            .join(&format!("b/id/{cover_id}-{COVER_SIZE}.jpg"))
            .map_err(|e| LookupError::Parse(e.to_string()))?;
        url.set_query(Some("default=false"));
        Ok(url)
    }
}

#[async_trait]
impl CoverSource for OpenLibraryClient {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, LookupError> {
        let start = Instant::now();
        tracing::debug!("searching Open Library: q={}", request.q);

        let response = self
            .http
            .get(self.search_url.clone())
            .header(header::ACCEPT, "application/json")
            .query(request)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let parsed: SearchResponse = serde_json::from_slice(&bytes).map_err(|e| LookupError::Parse(e.to_string()))?;

        tracing::debug!("search completed in {:?}, {} docs", start.elapsed(), parsed.docs.len());
        Ok(parsed)
    }

    async fn fetch_cover(&self, cover_id: u64) -> Result<Bytes, LookupError> {
        let url = self.cover_url(cover_id)?;
        let limit = self.config.max_image_bytes;

        let response = self.http.get(url).timeout(self.config.timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpError { status: status.as_u16() });
        }

        if let Some(len) = response.content_length()
            && len as usize > limit
        {
            return Err(LookupError::TooLarge { size: len as usize, limit });
        }

        let bytes = response.bytes().await?;
        if bytes.len() > limit {
            return Err(LookupError::TooLarge { size: bytes.len(), limit });
        }

        tracing::debug!("fetched cover {} ({} bytes)", cover_id, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    /// Accept one connection and never answer.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((socket, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            }
        });
        format!("http://{addr}")
    }

    fn http_response(status: &str, content_type: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn client_for(base: &str, timeout: Duration) -> OpenLibraryClient {
        OpenLibraryClient::new(OpenLibraryConfig {
            search_base_url: base.to_string(),
            covers_base_url: base.to_string(),
            timeout,
            ..Default::default()
        })
        .unwrap()
    }

    fn dune() -> SearchRequest {
        SearchRequest::from_metadata("Dune", Some("Frank Herbert"), 5).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = OpenLibraryConfig::default();
        assert_eq!(config.search_base_url, "https://openlibrary.org");
        assert_eq!(config.covers_base_url, "https://covers.openlibrary.org");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_image_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_config_from_app_config() {
        let app = AppConfig { timeout_ms: 1_500, search_base_url: "http://localhost:9000".into(), ..Default::default() };
        let config = OpenLibraryConfig::from(&app);
        assert_eq!(config.timeout, Duration::from_millis(1_500));
        assert_eq!(config.search_base_url, "http://localhost:9000");
    }

    #[test]
    fn test_cover_url() {
        let client = OpenLibraryClient::new(OpenLibraryConfig::default()).unwrap();
        assert_eq!(
            client.cover_url(12345).unwrap().as_str(),
            "https://covers.openlibrary.org/b/id/12345-M.jpg?default=false"
        );
        assert_eq!(client.search_url.as_str(), "https://openlibrary.org/search.json");
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let client = client_for("http://mirror.local/openlibrary", DEFAULT_TIMEOUT);
        assert_eq!(client.search_url.as_str(), "http://mirror.local/openlibrary/search.json");
        assert_eq!(
            client.cover_url(1).unwrap().as_str(),
            "http://mirror.local/openlibrary/b/id/1-M.jpg?default=false"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = OpenLibraryClient::new(OpenLibraryConfig { search_base_url: "nope".into(), ..Default::default() });
        assert!(matches!(result, Err(LookupError::Parse(_))));
    }

    #[tokio::test]
    async fn test_search_parses_docs() {
        let body = r#"{"numFound": 2, "docs": [{}, {"cover_i": 12345}]}"#;
        let base = serve_once(http_response("200 OK", "application/json", body)).await;
        let client = client_for(&base, DEFAULT_TIMEOUT);

        let response = client.search(&dune()).await.unwrap();
        assert_eq!(response.first_cover_id(), Some(12345));
    }

    #[tokio::test]
    async fn test_search_non_success_status() {
        let base = serve_once(http_response("503 Service Unavailable", "text/plain", "busy")).await;
        let client = client_for(&base, DEFAULT_TIMEOUT);

        let result = client.search(&dune()).await;
        assert!(matches!(result, Err(LookupError::HttpError { status: 503 })));
    }

    #[tokio::test]
    async fn test_search_bad_json() {
        let base = serve_once(http_response("200 OK", "application/json", "<html>")).await;
        let client = client_for(&base, DEFAULT_TIMEOUT);

        let result = client.search(&dune()).await;
        assert!(matches!(result, Err(LookupError::Parse(_))));
    }

    #[tokio::test]
    async fn test_search_timeout() {
        let base = serve_silence().await;
        let client = client_for(&base, Duration::from_millis(200));

        let started = Instant::now();
        let result = client.search(&dune()).await;
        assert!(matches!(result, Err(LookupError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_fetch_cover_too_large() {
        let base = serve_once(http_response("200 OK", "image/jpeg", "0123456789")).await;
        let client = OpenLibraryClient::new(OpenLibraryConfig {
            covers_base_url: base,
            max_image_bytes: 4,
            ..Default::default()
        })
        .unwrap();

        let result = client.fetch_cover(1).await;
        assert!(matches!(result, Err(LookupError::TooLarge { size: 10, limit: 4 })));
    }

    #[tokio::test]
    async fn test_fetch_cover_not_found() {
        let base = serve_once(http_response("404 Not Found", "text/plain", "")).await;
        let client = client_for(&base, DEFAULT_TIMEOUT);

        let result = client.fetch_cover(99).await;
        assert!(matches!(result, Err(LookupError::HttpError { status: 404 })));
    }

    #[tokio::test]
    async fn test_fetch_cover_ok() {
        let base = serve_once(http_response("200 OK", "image/jpeg", "jpeg")).await;
        let client = client_for(&base, DEFAULT_TIMEOUT);

        let bytes = client.fetch_cover(7).await.unwrap();
        assert_eq!(bytes.as_ref(), b"jpeg");
    }
}
