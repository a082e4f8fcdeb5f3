use ratatui::widgets::ListState;

use tracing::debug;

use crate::controller::{CycleReport, Phase};
use crate::render::StreamMsg;
use crate::source::Entry;

/// Something the user asked for that the main loop has to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Render the next batch.
    LoadMore,
    /// Start over with the same sources.
    Reload,
    /// Start over with the sources of a `?url=...` back-link.
    Follow(String),
}

pub struct App {
    /// Rendered entries, in the order they were delivered.  Append-only.
    pub items: Vec<Entry>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last status message.
    pub status: String,
    /// The stream ended; further loads are pointless.
    pub exhausted: bool,
    pub last_cycle: Option<CycleReport>,
    /// Sources dropped after a failed fetch, this session.
    pub failed_sources: usize,
    /// Pending request for the main loop.
    pub request: Option<Request>,
    /// Rows from the bottom at which scrolling asks for more.
    bottom_distance: usize,
}

impl App {
    pub fn new(bottom_distance: usize) -> Self {
        Self {
            items: Vec::new(),
            list_state: ListState::default(),
            quit: false,
            status: "Loading…".into(),
            exhausted: false,
            last_cycle: None,
            failed_sources: 0,
            request: None,
            bottom_distance,
        }
    }

    /// Forget everything rendered so far, for a fresh session.
    pub fn reset(&mut self) {
        *self = Self::new(self.bottom_distance);
    }

    /// Append a rendered batch below what is already shown.
    pub fn append_entries(&mut self, entries: Vec<Entry>) {
        self.items.extend(entries);
        if self.list_state.selected().is_none() && !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    /// Apply one message from the load controller.
    pub fn apply(&mut self, msg: StreamMsg) {
        match msg {
            StreamMsg::Entries(entries) => {
                let count = entries.len();
                self.append_entries(entries);
                self.status = format!("Loaded {count} entries");
                // The selection may still be near the bottom after a batch.
                self.load_if_near_bottom();
            }
            StreamMsg::Cycle(report) => {
                self.failed_sources += report.failed;
                self.last_cycle = Some(report);
            }
            StreamMsg::Exhausted => {
                self.exhausted = true;
                self.status = "End of stream".into();
            }
        }
    }

    pub fn selected(&self) -> Option<&Entry> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }

    pub fn take_request(&mut self) -> Option<Request> {
        self.request.take()
    }

    // -- loading triggers ----------------------------------------------------

    /// Whether the selection is close enough to the end to want more.
    pub fn near_bottom(&self) -> bool {
        let position = self.list_state.selected().unwrap_or(0);
        position + self.bottom_distance + 1 >= self.items.len()
    }

    /// Scroll trigger: ask for more when the selection is near the bottom.
    pub fn load_if_near_bottom(&mut self) {
        if self.near_bottom() {
            self.load_more();
        }
    }

    /// Manual trigger.
    pub fn load_more(&mut self) {
        if !self.exhausted && self.request.is_none() {
            self.request = Some(Request::LoadMore);
        }
    }

    /// The controller refused a load.  While a load is in flight the request
    /// is re-armed, so the next tick retries if the selection is still near
    /// the bottom.  An exhausted controller is left alone.
    pub fn trigger_dropped(&mut self, phase: Phase) {
        match phase {
            Phase::Exhausted => debug!("stream exhausted, trigger ignored"),
            phase => {
                debug!(?phase, "load in flight, trigger dropped");
                self.load_if_near_bottom();
            }
        }
    }

    pub fn reload(&mut self) {
        self.request = Some(Request::Reload);
    }

    /// Open the selected entry's feed on its own.
    pub fn follow_selected(&mut self) {
        if let Some(link) = self.selected().map(|e| e.feed_link.clone()) {
            self.request = Some(Request::Follow(link));
        }
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }

    pub fn page_down(&mut self, rows: usize) {
        if self.items.is_empty() {
            return;
        }
        let i = self.list_state.selected().unwrap_or(0) + rows;
        self.list_state.select(Some(i.min(self.items.len() - 1)));
    }
}
