//! YTS (yts.mx) API client.
//!
//! No API key is needed. Searches go to `list_movies.json`, newest first.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::types::{CatalogMovie, CatalogQuery, ReleaseFormat};
use super::{CatalogError, ReleaseCatalog};
use crate::config::CatalogConfig;

/// YTS API client.
pub struct YtsClient {
    client: Client,
    base_url: String,
    limit: u32,
}

impl YtsClient {
    /// Create a client from catalog configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        Self::from_parts(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            config.limit,
        )
    }

    /// Create a client with an explicit base URL and request timeout.
    pub fn from_parts(
        base_url: &str,
        timeout: Duration,
        limit: u32,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("media-hygiene/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CatalogError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            limit,
        })
    }
}

#[async_trait]
impl ReleaseCatalog for YtsClient {
    fn name(&self) -> &str {
        "yts"
    }

    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogMovie>, CatalogError> {
        let url = format!("{}/list_movies.json", self.base_url);
        let term = query.term();
        let limit = self.limit.to_string();

        debug!("YTS movie search: query_term='{}'", term);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query_term", term.as_str()),
                ("limit", limit.as_str()),
                ("sort_by", "year"),
                ("order_by", "desc"),
            ])
            .send()
            .await?;

        let status = response.status();
        if status == 429 {
            return Err(CatalogError::RateLimitExceeded);
        }
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ServerError {
                status: status.as_u16(),
                message: body,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        parse_list_movies(&body)
    }
}

/// Parse a `list_movies.json` body. A missing `movies` array means no results.
pub(crate) fn parse_list_movies(body: &str) -> Result<Vec<CatalogMovie>, CatalogError> {
    let envelope: YtsEnvelope = serde_json::from_str(body).map_err(|e| {
        CatalogError::ParseError(format!("Failed to parse list_movies response: {}", e))
    })?;

    if !envelope.status.is_empty() && !envelope.status.eq_ignore_ascii_case("ok") {
        return Err(CatalogError::ApiError {
            status: 200,
            message: envelope.status_message,
        });
    }

    let movies = envelope
        .data
        .and_then(|d| d.movies)
        .unwrap_or_default()
        .into_iter()
        .map(CatalogMovie::from)
        .collect();

    Ok(movies)
}

// YTS API response types

#[derive(Debug, Deserialize)]
struct YtsEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    #[serde(default)]
    movies: Option<Vec<YtsMovie>>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    year: Option<u16>,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    imdb_code: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    torrents: Option<Vec<YtsTorrent>>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    size_bytes: Option<u64>,
    #[serde(default)]
    seeds: Option<u32>,
    #[serde(default)]
    peers: Option<u32>,
}

impl From<YtsMovie> for CatalogMovie {
    fn from(m: YtsMovie) -> Self {
        Self {
            id: m.id,
            title: m.title.unwrap_or_default(),
            year: m.year.unwrap_or_default(),
            rating: m.rating.unwrap_or_default(),
            imdb_code: m.imdb_code.unwrap_or_default(),
            url: m.url.unwrap_or_default(),
            formats: m
                .torrents
                .unwrap_or_default()
                .into_iter()
                .map(ReleaseFormat::from)
                .collect(),
        }
    }
}

impl From<YtsTorrent> for ReleaseFormat {
    fn from(t: YtsTorrent) -> Self {
        Self {
            quality: t.quality.unwrap_or_default(),
            release_type: t.kind.unwrap_or_default(),
            size: t.size.unwrap_or_default(),
            size_bytes: t.size_bytes.unwrap_or_default(),
            seeds: t.seeds.unwrap_or_default(),
            peers: t.peers.unwrap_or_default(),
            hash: t.hash.filter(|h| !h.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const HEAT_BODY: &str = r#"{
        "status": "ok",
        "status_message": "Query was successful",
        "data": {
            "movie_count": 2,
            "limit": 10,
            "movies": [
                {
                    "id": 1,
                    "url": "https://yts.mx/movies/heat-2022",
                    "imdb_code": "tt9999999",
                    "title": "Heat",
                    "year": 2022,
                    "rating": 4.1,
                    "torrents": []
                },
                {
                    "id": 2,
                    "url": "https://yts.mx/movies/heat-1995",
                    "imdb_code": "tt0113277",
                    "title": "Heat",
                    "year": 1995,
                    "rating": 8.3,
                    "torrents": [
                        {"hash": "AAA", "quality": "1080p", "type": "bluray", "size": "2.5 GB", "size_bytes": 2684354560, "seeds": 100, "peers": 5},
                        {"quality": "720p", "type": "bluray", "size": "1.2 GB", "seeds": 50, "peers": 1}
                    ]
                }
            ]
        }
    }"#;

    /// Serve one canned HTTP response and hand back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}", addr), handle)
    }

    fn client(base_url: &str) -> YtsClient {
        YtsClient::from_parts(base_url, Duration::from_secs(5), 10).unwrap()
    }

    #[test]
    fn test_parse_list_movies() {
        let movies = parse_list_movies(HEAT_BODY).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].year, 1995);
        assert_eq!(movies[1].formats.len(), 2);
        assert_eq!(movies[1].formats[0].hash.as_deref(), Some("AAA"));
        assert_eq!(movies[1].formats[1].hash, None);
        assert_eq!(movies[1].magnets().len(), 1);
    }

    #[test]
    fn test_parse_missing_movies_is_empty() {
        let body = r#"{"status":"ok","status_message":"","data":{"movie_count":0,"limit":10}}"#;
        assert!(parse_list_movies(body).unwrap().is_empty());

        let body = r#"{"status":"ok"}"#;
        assert!(parse_list_movies(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_error_status() {
        let body = r#"{"status":"error","status_message":"bad query"}"#;
        let err = parse_list_movies(body).unwrap_err();
        assert!(matches!(err, CatalogError::ApiError { .. }));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_list_movies("<html>").unwrap_err();
        assert!(matches!(err, CatalogError::ParseError(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_search_sends_expected_query() {
        let (base, handle) = serve_once("200 OK", HEAT_BODY).await;
        let movies = client(&base)
            .search(&CatalogQuery::new("Heat", Some(1995)))
            .await
            .unwrap();
        assert_eq!(movies.len(), 2);

        let request = handle.await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /list_movies.json?"));
        assert!(request_line.contains("query_term=Heat+1995"));
        assert!(request_line.contains("limit=10"));
        assert!(request_line.contains("sort_by=year"));
        assert!(request_line.contains("order_by=desc"));
    }

    #[tokio::test]
    async fn test_search_rate_limited() {
        let (base, _handle) = serve_once("429 Too Many Requests", "").await;
        let err = client(&base)
            .search(&CatalogQuery::new("Heat", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::RateLimitExceeded));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_search_server_error() {
        let (base, _handle) = serve_once("503 Service Unavailable", "down").await;
        let err = client(&base)
            .search(&CatalogQuery::new("Heat", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ServerError { status: 503, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_search_client_error_is_terminal() {
        let (base, _handle) = serve_once("404 Not Found", "missing").await;
        let err = client(&base)
            .search(&CatalogQuery::new("Heat", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ApiError { status: 404, .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_search_bad_json() {
        let (base, _handle) = serve_once("200 OK", "not json").await;
        let err = client(&base)
            .search(&CatalogQuery::new("Heat", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_search_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .search(&CatalogQuery::new("Heat", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ConnectionFailed(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_search_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client =
            YtsClient::from_parts(&format!("http://{}", addr), Duration::from_millis(200), 10)
                .unwrap();
        let err = client
            .search(&CatalogQuery::new("Heat", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Timeout(_)));
    }
}
