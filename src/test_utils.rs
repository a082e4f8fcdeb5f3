//! In-memory fetcher and renderer for controller tests.
//!
//! `ScriptedFetcher` answers from a fixed table and records every request
//! URL; `RecordingRenderer` keeps every batch it was handed.
//! `canned_server` answers real HTTP on a local port for client tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::controller::CycleReport;
use crate::error::FetchError;
use crate::render::Renderer;
use crate::source::{Entry, FeedPage, PageFetcher};

/// Shorthand entry constructor.
pub fn entry(title: &str, dt: f64) -> Entry {
    Entry {
        dt,
        title: Some(title.to_string()),
        link: Some(format!("https://example.com/{title}/{dt}")),
        source: Some(title.to_string()),
        source_link: None,
        content: String::new(),
        origin: String::new(),
        feed_link: String::new(),
    }
}

/// `count` entries titled `title`, newest first, starting at `newest`.
pub fn entries(title: &str, newest: f64, count: usize) -> Vec<Entry> {
    (0..count).map(|i| entry(title, newest - i as f64)).collect()
}

enum Scripted {
    Page(FeedPage),
    Fail(u16),
}

/// Request URLs not in the script answer with an empty page.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, entries: Vec<Entry>, next: Option<&str>) -> Self {
        self.script.insert(
            url.to_string(),
            Scripted::Page(FeedPage {
                entries,
                continuation: next.map(String::from),
            }),
        );
        self
    }

    pub fn fail(mut self, url: &str, status: u16) -> Self {
        self.script.insert(url.to_string(), Scripted::Fail(status));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, request_url: &str) -> Result<FeedPage, FetchError> {
        self.calls.lock().unwrap().push(request_url.to_string());
        // Suspend like a real request so overlapping callers get to run.
        tokio::task::yield_now().await;

        match self.script.get(request_url) {
            Some(Scripted::Page(page)) => Ok(page.clone()),
            Some(Scripted::Fail(status)) => Err(FetchError::Status {
                url: request_url.to_string(),
                status: *status,
            }),
            None => Ok(FeedPage::default()),
        }
    }
}

#[derive(Default)]
pub struct RecordingRenderer {
    batches: Mutex<Vec<Vec<Entry>>>,
    reports: Mutex<Vec<CycleReport>>,
    exhausted: AtomicUsize,
}

impl RecordingRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn batches(&self) -> Vec<Vec<Entry>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn rendered(&self) -> usize {
        self.batches.lock().unwrap().iter().map(Vec::len).sum()
    }

    pub fn reports(&self) -> Vec<CycleReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn exhausted_signals(&self) -> usize {
        self.exhausted.load(Ordering::SeqCst)
    }
}

impl Renderer for Arc<RecordingRenderer> {
    fn render(&self, entries: Vec<Entry>) {
        self.batches.lock().unwrap().push(entries);
    }

    fn exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::SeqCst);
    }

    fn cycle_finished(&self, report: &CycleReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

/// Serve the same response to every connection on a free local port.
///
/// Returns the base URL and the request lines received so far.
pub async fn canned_server(
    status: &'static str,
    body: &'static str,
) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = vec![0u8; 16 * 1024];
            let mut read = 0;
            while read < buf.len() {
                let n = stream.read(&mut buf[read..]).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                read += n;
                if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let head = String::from_utf8_lossy(&buf[..read]);
            if let Some(line) = head.lines().next() {
                seen.lock().unwrap().push(line.to_string());
            }

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (base, requests)
}
