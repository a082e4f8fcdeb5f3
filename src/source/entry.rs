//! The core data type flowing from the `/parse` service to the screen.
//!
//! `Entry` is what the parse service returns for a single feed item, plus two
//! fields the client fills in itself: the source URL the entry was fetched
//! from and a back-link query string pointing at that source.
//!
//! ## For contributors
//!
//! Entries are immutable once fetched.  The buffer owns them until a batch is
//! handed to the renderer, after which they belong to the UI.

use std::cmp::Ordering;

use chrono::{DateTime, Local};
use serde::Deserialize;

/// A single feed entry as delivered by the parse service.
///
/// ## Sorting
///
/// [`Entry::newest_first`] orders by `dt` descending.  `dt` is the only sort
/// key; ties keep their arrival order because the buffer uses a stable sort.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entry {
    /// Publication time in seconds since the epoch.
    pub dt: f64,

    #[serde(default)]
    pub title: Option<String>,

    /// Link to the full item.
    #[serde(default)]
    pub link: Option<String>,

    /// Display name of the feed.
    #[serde(default)]
    pub source: Option<String>,

    /// Homepage of the feed.
    #[serde(default)]
    pub source_link: Option<String>,

    /// HTML fragment.  The parse service is trusted to have sanitized it, so
    /// it is shown verbatim.
    #[serde(default)]
    pub content: String,

    /// Source URL (the configured one, not the paged or tokened request URL)
    /// this entry was fetched from.  Filled in when its page arrives.
    #[serde(skip)]
    pub origin: String,

    /// `?url=<origin>` back-link for opening this entry's feed on its own.
    #[serde(skip)]
    pub feed_link: String,
}

impl Entry {
    /// Reverse-chronological comparison: newer entries sort first.
    pub fn newest_first(a: &Entry, b: &Entry) -> Ordering {
        b.dt.total_cmp(&a.dt)
    }

    /// Attach the originating source and synthesize the feed back-link.
    pub fn tag_origin(&mut self, origin: &str) {
        self.origin = origin.to_string();
        self.feed_link = feed_link(origin);
    }

    /// `dt` as a local timestamp, if it is representable.
    pub fn published(&self) -> Option<DateTime<Local>> {
        DateTime::from_timestamp(self.dt as i64, 0).map(|d| d.with_timezone(&Local))
    }

    /// Title for display, `(untitled)` when the feed gave none.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }

    /// Feed name for display, falling back to the origin URL.
    pub fn display_source(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.origin)
    }
}

/// Build the `?url=...` back-link query string for a source URL.
pub fn feed_link(source_url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(source_url.as_bytes()).collect();
    format!("?url={encoded}")
}
