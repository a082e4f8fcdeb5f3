//! Error types for page fetching.
//!
//! A [`FetchError`] only ever concerns one request for one source.  The load
//! controller logs it and drops that source; it never aborts a cycle.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url}: parse service answered {status}")]
    Status { url: String, status: u16 },

    #[error("{url}: request failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url}: undecodable response: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The request URL the failure belongs to.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }
}
