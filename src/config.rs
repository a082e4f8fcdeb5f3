//! Command-line and environment configuration.
//!
//! The connection options can also come from `LIVESCROLL_*` environment
//! variables, and a `.env` file in the working directory is read first.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::TypedValueParser;
use clap::Parser;

use crate::controller::{Settings, LOW_WATER, RENDER_BATCH};

/// Merge paginated feeds into one live-scrolling stream.
#[derive(Parser, Debug, Clone)]
#[command(name = "livescroll", version, about)]
pub struct Config {
    /// Feed URLs, optionally containing a {page} placeholder.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Query string with repeated `url` parameters, e.g. "?url=a&url=b".
    /// Used when no URLs are given.
    #[arg(short, long, env = "LIVESCROLL_QUERY")]
    pub query: Option<String>,

    /// Base URL of the parse service (serves /parse and /config).
    #[arg(
        short,
        long,
        env = "LIVESCROLL_SERVER",
        default_value = "http://127.0.0.1:5000"
    )]
    pub server: String,

    /// Entries rendered per load.
    #[arg(long, default_value_t = RENDER_BATCH, value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub batch_size: usize,

    /// Fetch ahead whenever fewer entries than this are buffered.
    #[arg(long, default_value_t = LOW_WATER, value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub low_water: usize,

    /// Load more once the selection is this many rows from the bottom.
    #[arg(long, default_value_t = 5)]
    pub bottom_distance: usize,

    /// Per-request timeout in seconds.  Unbounded when unset.
    #[arg(long, env = "LIVESCROLL_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Where to write logs; the terminal belongs to the UI.
    #[arg(long, env = "LIVESCROLL_LOG_FILE", default_value = "livescroll.log")]
    pub log_file: PathBuf,
}

impl Config {
    /// Parse the process arguments after loading `.env`.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            batch_size: self.batch_size,
            low_water: self.low_water,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_controller_constants() {
        let config = Config::try_parse_from(["livescroll"]).unwrap();

        assert!(config.urls.is_empty());
        assert_eq!(config.settings(), Settings::default());
        assert_eq!(config.bottom_distance, 5);
        assert!(config.timeout().is_none());
    }

    #[test]
    fn positional_urls_and_overrides() {
        let config = Config::try_parse_from([
            "livescroll",
            "https://a.example/rss",
            "https://b.example/feed?page={page}",
            "--server",
            "http://localhost:8000",
            "--batch-size",
            "4",
            "--low-water",
            "12",
            "--timeout",
            "9",
        ])
        .unwrap();

        assert_eq!(config.urls.len(), 2);
        assert_eq!(config.server, "http://localhost:8000");
        assert_eq!(
            config.settings(),
            Settings {
                batch_size: 4,
                low_water: 12
            }
        );
        assert_eq!(config.timeout(), Some(Duration::from_secs(9)));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(Config::try_parse_from(["livescroll", "--batch-size", "0"]).is_err());
    }
}
