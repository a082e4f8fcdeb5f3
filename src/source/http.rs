//! `/parse` service client.
//!
//! Every page request is `GET <server>/parse?url=<request-url>`, answered
//! with `{"entries": [...], "next": "..."}`.  The service does the feed
//! parsing; this module only moves JSON.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::{Entry, FeedPage, PageFetcher};
use crate::error::FetchError;

/// Wire shape of a `/parse` response.
#[derive(Debug, Deserialize)]
struct ParseResponse {
    /// Older servers answer `{}` when parsing failed.
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default)]
    next: Option<String>,
}

/// Fetches pages through a parse service over HTTP.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    server: String,
}

impl HttpFetcher {
    /// Create a fetcher for the parse service at `server`.
    ///
    /// `timeout` applies to each request.  `None` leaves requests unbounded
    /// and lets the transport decide.
    pub fn new(server: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            server: server.trim_end_matches('/').to_string(),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Endpoint URL under the configured server, e.g. `/parse`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    /// Decode a `/parse` body.  Pure, so tests need no network.
    pub fn parse_page(body: &[u8], request_url: &str) -> Result<FeedPage, FetchError> {
        let response: ParseResponse =
            serde_json::from_slice(body).map_err(|source| FetchError::Decode {
                url: request_url.to_string(),
                source,
            })?;

        Ok(FeedPage {
            entries: response.entries,
            continuation: response.next.filter(|next| !next.is_empty()),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request_url: &str) -> Result<FeedPage, FetchError> {
        let transport = |source| FetchError::Transport {
            url: request_url.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.endpoint("/parse"))
            .query(&[("url", request_url)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request_url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        Self::parse_page(&body, request_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::canned_server;

    #[test]
    fn parse_page_extracts_entries_and_next() {
        let body = br#"{
            "url": "https://social.example/outbox",
            "next": "https://social.example/outbox?page=2",
            "entries": [
                {"dt": 200, "title": "Second", "link": "https://social.example/2", "content": ""},
                {"dt": 100, "title": "First", "link": "https://social.example/1", "content": "<p>hi</p>"}
            ]
        }"#;

        let page = HttpFetcher::parse_page(body, "https://social.example/outbox").unwrap();

        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].title.as_deref(), Some("Second"));
        assert_eq!(page.entries[1].content, "<p>hi</p>");
        assert_eq!(
            page.continuation.as_deref(),
            Some("https://social.example/outbox?page=2")
        );
    }

    #[test]
    fn missing_next_means_no_continuation() {
        let page = HttpFetcher::parse_page(br#"{"entries": []}"#, "u").unwrap();
        assert!(page.entries.is_empty());
        assert!(page.continuation.is_none());
    }

    #[test]
    fn null_or_empty_next_means_no_continuation() {
        let page = HttpFetcher::parse_page(br#"{"entries": [], "next": null}"#, "u").unwrap();
        assert!(page.continuation.is_none());

        let page = HttpFetcher::parse_page(br#"{"entries": [], "next": ""}"#, "u").unwrap();
        assert!(page.continuation.is_none());
    }

    #[test]
    fn empty_object_is_an_empty_page() {
        let page = HttpFetcher::parse_page(b"{}", "u").unwrap();
        assert_eq!(page, FeedPage::default());
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = HttpFetcher::parse_page(b"<html>", "https://a.example/rss").unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(err.url(), "https://a.example/rss");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let fetcher = HttpFetcher::new("http://127.0.0.1:5000/", None).unwrap();
        assert_eq!(fetcher.server(), "http://127.0.0.1:5000");
        assert_eq!(fetcher.endpoint("/parse"), "http://127.0.0.1:5000/parse");
    }

    #[tokio::test]
    async fn fetch_returns_page_with_continuation() {
        let (server, requests) = canned_server(
            "200 OK",
            r#"{"entries": [{"dt": 10, "title": "One"}], "next": "https://a.example/rss?after=10"}"#,
        )
        .await;
        let fetcher = HttpFetcher::new(&server, None).unwrap();

        let page = fetcher.fetch("https://a.example/rss?p=0").await.unwrap();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].display_title(), "One");
        assert_eq!(
            page.continuation.as_deref(),
            Some("https://a.example/rss?after=10")
        );
        let requests = requests.lock().unwrap();
        assert!(
            requests[0].starts_with("GET /parse?url=https%3A%2F%2Fa.example%2Frss%3Fp%3D0 "),
            "request URL is passed as an encoded query parameter: {}",
            requests[0]
        );
    }

    #[tokio::test]
    async fn non_success_status_is_a_status_error() {
        let (server, _) = canned_server("500 Internal Server Error", "oops").await;
        let fetcher = HttpFetcher::new(&server, None).unwrap();

        let err = fetcher.fetch("https://a.example/rss").await.unwrap_err();

        assert!(
            matches!(err, FetchError::Status { status: 500, .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.url(), "https://a.example/rss");
    }

    #[tokio::test]
    async fn success_with_bad_body_is_a_decode_error() {
        let (server, _) = canned_server("200 OK", "<html>").await;
        let fetcher = HttpFetcher::new(&server, None).unwrap();

        let err = fetcher.fetch("https://a.example/rss").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
