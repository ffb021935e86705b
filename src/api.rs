//! News API access.
//!
//! This module provides the interface the search controller uses to fetch
//! articles, plus its HTTP implementation.
//!
//! # Architecture
//!
//! - [`NewsApi`]: Core trait defining an async search call
//! - [`HttpNewsApi`]: `reqwest`-backed implementation talking to
//!   `GET <base>/news/search?query=...`
//!
//! The trait is the seam between the state machine and the network; the
//! session driver only ever sees `NewsApi`, which keeps it testable with an
//! in-memory fake.
//!
//! # Failure Classification
//!
//! - Non-2xx status: [`FetchError::Status`], shown as "Failed to fetch news."
//! - Connection problems: [`FetchError::Transport`]
//! - Body is not JSON: [`FetchError::Decode`]
//! - Configured timeout elapsed: [`FetchError::Timeout`]
//!
//! There is no automatic retry; the user resubmits.

use crate::config::{SearchOptions, Settings};
use crate::error::{ConfigError, FetchError};
use crate::models::{DisplayItem, SearchResponse};
use crate::utils::{encode_component, looks_truncated, truncate_for_log};
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::{Host, Url};

/// Trait for async news search.
///
/// Implementors take a raw query string and return normalized display items.
/// The returned future must be `Send` so the session driver can run it on a
/// spawned task.
pub trait NewsApi: Send + Sync + 'static {
    /// Search for articles matching `query`.
    ///
    /// # Returns
    ///
    /// The normalized items (possibly empty), or a [`FetchError`] if the
    /// request failed or the body could not be parsed.
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<DisplayItem>, FetchError>> + Send;
}

/// HTTP client for the news search endpoint.
#[derive(Debug, Clone)]
pub struct HttpNewsApi {
    client: Client,
    base_url: Url,
    options: SearchOptions,
    placeholder_image: String,
}

impl HttpNewsApi {
    /// Build a client from resolved settings.
    ///
    /// The base URL, timeout, extra search options and placeholder image all
    /// come from `settings`; nothing is hard-coded here. Loopback base URLs
    /// bypass any system proxy.
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        if is_loopback(&settings.base_url) {
            builder = builder.no_proxy();
        }

        Ok(Self {
            client: builder.build()?,
            base_url: settings.base_url.clone(),
            options: settings.search.clone(),
            placeholder_image: settings.placeholder_image.clone(),
        })
    }

    /// The full request URL for `query`.
    ///
    /// The query is always the first parameter; optional search filters
    /// follow only when configured.
    pub fn search_url(&self, query: &str) -> String {
        let mut url = format!(
            "{}/news/search?query={}",
            self.base_url.as_str().trim_end_matches('/'),
            encode_component(query)
        );
        for (key, value) in self.options.pairs() {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&encode_component(&value));
        }
        url
    }
}

impl NewsApi for HttpNewsApi {
    #[instrument(level = "info", skip(self))]
    async fn search(&self, query: &str) -> Result<Vec<DisplayItem>, FetchError> {
        let t0 = Instant::now();
        let url = self.search_url(query);
        debug!(%url, "Requesting news");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "News request failed");
            FetchError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "News API returned an error status"
            );
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| {
            if looks_truncated(&e) {
                warn!(error = %e, bytes = body.len(), "Response body looks truncated");
            } else {
                warn!(
                    error = %e,
                    body_preview = %truncate_for_log(&body, 300),
                    "Response body is not valid JSON"
                );
            }
            FetchError::Decode(e)
        })?;

        let items = SearchResponse::from_value(value).into_display_items(&self.placeholder_image);
        info!(
            count = items.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched news"
        );
        Ok(items)
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_base_url;
    use crate::models::PLACEHOLDER_IMAGE;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one canned HTTP response and report the request head.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (Url, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&head).into_owned());

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (Url::parse(&format!("http://{addr}")).unwrap(), rx)
    }

    fn api_for(base_url: Url) -> HttpNewsApi {
        let settings = Settings {
            base_url,
            ..Settings::default()
        };
        HttpNewsApi::new(&settings).unwrap()
    }

    #[test]
    fn test_search_url_default() {
        let api = api_for(parse_base_url("http://127.0.0.1:8000").unwrap());
        assert_eq!(
            api.search_url("New Zealand"),
            "http://127.0.0.1:8000/news/search?query=New%20Zealand"
        );
    }

    #[test]
    fn test_search_url_keeps_base_path_and_options() {
        let settings = Settings {
            base_url: parse_base_url("https://news.example/api/").unwrap(),
            search: SearchOptions {
                country: Some("KR".to_string()),
                page_size: Some(5),
                ..SearchOptions::default()
            },
            ..Settings::default()
        };
        let api = HttpNewsApi::new(&settings).unwrap();

        assert_eq!(
            api.search_url("k-pop"),
            "https://news.example/api/news/search?query=k-pop&country_code=kr&page_size=5"
        );
    }

    #[test]
    fn test_is_loopback() {
        assert!(is_loopback(&Url::parse("http://127.0.0.1:8000").unwrap()));
        assert!(is_loopback(&Url::parse("http://localhost:8000").unwrap()));
        assert!(is_loopback(&Url::parse("http://[::1]:8000").unwrap()));
        assert!(!is_loopback(&Url::parse("http://news.example").unwrap()));
    }

    #[tokio::test]
    async fn test_search_success() {
        let (base, request) = serve_once(
            "200 OK",
            r#"{"status":"success","data":[{"title":"A","url":"u1","urlToImage":"img1"}]}"#,
        )
        .await;

        let items = api_for(base).search("Japan").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "A");
        assert_eq!(items[0].url, "u1");
        assert_eq!(items[0].image, "img1");
        assert_eq!(items[0].description, None);

        let head = request.await.unwrap();
        assert!(head.starts_with("GET /news/search?query=Japan HTTP/1.1"), "{head}");
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let (base, request) = serve_once("200 OK", r#"{"data":[]}"#).await;

        api_for(base).search("South Korea & Japan").await.unwrap();
        let head = request.await.unwrap();
        assert!(
            head.starts_with("GET /news/search?query=South%20Korea%20%26%20Japan "),
            "{head}"
        );
    }

    #[tokio::test]
    async fn test_search_missing_data_is_empty() {
        let (base, _request) = serve_once("200 OK", r#"{"status":"success"}"#).await;
        let items = api_for(base).search("Japan").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_search_placeholder_image() {
        let (base, _request) = serve_once("200 OK", r#"{"data":[{"title":"B","url":"u2"}]}"#).await;
        let items = api_for(base).search("Japan").await.unwrap();
        assert_eq!(items[0].image, PLACEHOLDER_IMAGE);
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let (base, _request) =
            serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#).await;

        let err = api_for(base).search("Japan").await.unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));
        assert_eq!(err.to_string(), "Failed to fetch news.");
    }

    #[tokio::test]
    async fn test_search_invalid_json() {
        let (base, _request) = serve_once("200 OK", "<html>oops</html>").await;

        let err = api_for(base).search("Japan").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_search_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = api_for(Url::parse(&format!("http://{addr}")).unwrap())
            .search("Japan")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_search_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let settings = Settings {
            base_url: Url::parse(&format!("http://{addr}")).unwrap(),
            timeout: Some(Duration::from_millis(100)),
            ..Settings::default()
        };
        let err = HttpNewsApi::new(&settings)
            .unwrap()
            .search("Japan")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }
}
