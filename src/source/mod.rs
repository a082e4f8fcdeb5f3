//! Page source abstraction layer.
//!
//! This module defines the [`PageFetcher`] trait, the [`FeedPage`] it
//! produces, and the common [`Entry`] type.  Feed formats are parsed by the
//! external `/parse` service; the client only ever sees its JSON.
//!
//! ## For contributors: adding a new fetcher
//!
//! 1. Create a new file in this directory (e.g. `cache.rs`).
//! 2. Define a struct and implement [`PageFetcher`] for it.
//! 3. Add `mod cache;` below and re-export your struct.
//! 4. Hand an instance to `LoadController::new` in `main.rs`.
//!
//! The load controller, buffer and UI are fetcher-agnostic.

mod entry;
mod http;

pub use entry::Entry;
pub use http::HttpFetcher;

use async_trait::async_trait;

use crate::error::FetchError;

/// One page of one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub entries: Vec<Entry>,
    /// Opaque value to fetch next instead of the next page number.
    pub continuation: Option<String>,
}

/// Fetches a single page for a request URL.
///
/// Implementations must not touch controller state; they only return data.
/// The controller runs one call per active source concurrently, so
/// implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request_url: &str) -> Result<FeedPage, FetchError>;
}
