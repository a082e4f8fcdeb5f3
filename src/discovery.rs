//! Initial source discovery.
//!
//! Sources come from the first of these that yields anything:
//!
//! 1. URLs given on the command line,
//! 2. repeated `url` parameters of a query string (`?url=a&url=b`), which is
//!    also the shape of every entry's feed back-link,
//! 3. `GET <server>/config`, answering `{"urls": [...]}`.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;
use url::form_urlencoded;

use crate::source::HttpFetcher;

#[derive(Debug, Deserialize)]
struct RemoteConfig {
    #[serde(default)]
    urls: Vec<String>,
}

/// Every `url` parameter of a query string, decoded, in order.
///
/// Keys are decoded too, and escapes that are not valid UTF-8 decode lossily
/// instead of dropping the value.
pub fn urls_from_query(query: &str) -> Vec<String> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .filter(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|url| !url.is_empty())
        .collect()
}

/// Sources available without asking the server.
pub fn local_sources(urls: &[String], query: Option<&str>) -> Vec<String> {
    if !urls.is_empty() {
        return urls.to_vec();
    }
    query.map(urls_from_query).unwrap_or_default()
}

/// Ask the parse service for its configured sources.
pub async fn fetch_config(fetcher: &HttpFetcher) -> Result<Vec<String>> {
    let url = fetcher.endpoint("/config");
    let response = fetcher
        .client()
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?
        .error_for_status()
        .with_context(|| format!("{url} returned an error"))?;

    let config: RemoteConfig = response
        .json()
        .await
        .with_context(|| format!("Invalid config from {url}"))?;
    Ok(config.urls)
}

/// Resolve the initial source list.  Finding none is an error.
pub async fn discover(
    urls: &[String],
    query: Option<&str>,
    fetcher: &HttpFetcher,
) -> Result<Vec<String>> {
    let local = local_sources(urls, query);
    let sources = if local.is_empty() {
        info!(server = fetcher.server(), "no sources given, asking server");
        fetch_config(fetcher).await?
    } else {
        local
    };

    if sources.is_empty() {
        bail!("No urls provided");
    }
    info!(count = sources.len(), "sources discovered");
    Ok(sources)
}
