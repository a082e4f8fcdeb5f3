//! Load controller: decides when to fetch, when to render, and when to stop.
//!
//! ## Lifecycle of one [`LoadController::render_more`] call
//!
//! ```text
//!            ┌────────── busy? drop the call ──────────┐
//!   Idle ──► FetchingCycle (only if buffer is empty) ──► Rendering
//!                                                         │
//!          buffer empty after fetching ──► Exhausted ◄────┤
//!                                                         │
//!          < low_water buffered && sources left ──► FetchingCycle (refill)
//! ```
//!
//! Only one call runs at a time.  A call arriving while another one is in
//! flight returns [`Outcome::Busy`] immediately; it is not queued.  Once the
//! controller is [`Phase::Exhausted`] it never fetches again.
//!
//! ## For contributors
//!
//! Buffer, frontier and page counter are owned here and mutated nowhere else.
//! The mutex around them is only ever held between awaits, never across one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::buffer::EntryBuffer;
use crate::frontier::Frontier;
use crate::render::Renderer;
use crate::source::PageFetcher;

/// Entries handed to the renderer per call.
pub const RENDER_BATCH: usize = 10;

/// Buffered entries below which a refill cycle runs after rendering.
pub const LOW_WATER: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub batch_size: usize,
    pub low_water: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            batch_size: RENDER_BATCH,
            low_water: LOW_WATER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    FetchingCycle,
    Rendering,
    /// Terminal.  Every later call is a no-op.
    Exhausted,
}

/// What a single `render_more` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Another call was in flight; this one was dropped.
    Busy,
    /// Nothing left to show, now or ever.
    Exhausted,
    Rendered { count: usize, refilled: bool },
}

/// Summary of one fetch cycle.
///
/// `failed` and `exhausted` sources both leave the frontier; they are only
/// told apart here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub page: u64,
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub exhausted: usize,
    /// Entries fetched in this cycle.
    pub entries: usize,
    /// Entries waiting in the buffer after the cycle.
    pub buffered: usize,
    /// Sources still in the frontier after the cycle.
    pub active: usize,
}

struct Core {
    buffer: EntryBuffer,
    frontier: Frontier,
    /// 0-based, shared by every paged source.
    page: u64,
}

/// Held for the duration of one `render_more` call.  Dropping it reopens the
/// gate unless the stream was exhausted meanwhile.
struct Gate<'a> {
    phase: &'a Mutex<Phase>,
}

impl Gate<'_> {
    fn set(&self, phase: Phase) {
        *lock(self.phase) = phase;
    }
}

impl Drop for Gate<'_> {
    fn drop(&mut self) {
        let mut phase = lock(self.phase);
        if *phase != Phase::Exhausted {
            *phase = Phase::Idle;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct LoadController<F, R> {
    fetcher: F,
    renderer: R,
    settings: Settings,
    phase: Mutex<Phase>,
    core: Mutex<Core>,
}

impl<F: PageFetcher, R: Renderer> LoadController<F, R> {
    pub fn new<I, S>(sources: I, fetcher: F, renderer: R, settings: Settings) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fetcher,
            renderer,
            settings,
            phase: Mutex::new(Phase::Idle),
            core: Mutex::new(Core {
                buffer: EntryBuffer::new(),
                frontier: Frontier::from_sources(sources),
                page: 0,
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        *lock(&self.phase)
    }

    #[cfg(test)]
    pub fn buffered(&self) -> usize {
        lock(&self.core).buffer.len()
    }

    pub fn active_sources(&self) -> usize {
        lock(&self.core).frontier.len()
    }

    pub fn page(&self) -> u64 {
        lock(&self.core).page
    }

    #[cfg(test)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn try_enter(&self) -> Option<Gate<'_>> {
        let mut phase = lock(&self.phase);
        if *phase != Phase::Idle {
            return None;
        }
        *phase = Phase::Rendering;
        Some(Gate { phase: &self.phase })
    }

    /// Render the next batch, fetching first if nothing is buffered and
    /// refilling afterwards if the buffer runs low.
    pub async fn render_more(&self) -> Outcome {
        let Some(gate) = self.try_enter() else {
            return match self.phase() {
                Phase::Exhausted => Outcome::Exhausted,
                _ => Outcome::Busy,
            };
        };

        let nothing_buffered = lock(&self.core).buffer.is_empty();
        if nothing_buffered {
            gate.set(Phase::FetchingCycle);
            self.fetch_cycle().await;
        }

        gate.set(Phase::Rendering);
        let batch = lock(&self.core).buffer.take_batch(self.settings.batch_size);
        if batch.is_empty() {
            gate.set(Phase::Exhausted);
            info!(
                page = self.page(),
                sources = self.active_sources(),
                "stream exhausted"
            );
            self.renderer.exhausted();
            return Outcome::Exhausted;
        }

        let count = batch.len();
        self.renderer.render(batch);

        let refill = {
            let core = lock(&self.core);
            core.buffer.len() < self.settings.low_water && !core.frontier.is_empty()
        };
        if refill {
            gate.set(Phase::FetchingCycle);
            self.fetch_cycle().await;
        }

        Outcome::Rendered {
            count,
            refilled: refill,
        }
    }

    /// Fetch one page from every active source, concurrently, and wait for
    /// all of them to settle.
    ///
    /// Returns `None` without touching the page counter when no sources are
    /// left.
    async fn fetch_cycle(&self) -> Option<CycleReport> {
        let (snapshot, page) = {
            let mut core = lock(&self.core);
            (core.frontier.take_snapshot(), core.page)
        };
        if snapshot.is_empty() {
            return None;
        }

        let requests = snapshot.iter().map(|descriptor| {
            let url = descriptor.advance(page);
            let kind = descriptor.kind();
            async move {
                debug!(%url, ?kind, "fetching page");
                self.fetcher.fetch(&url).await
            }
        });
        let results = join_all(requests).await;

        let mut report = CycleReport {
            page,
            requested: snapshot.len(),
            ..CycleReport::default()
        };

        let mut core = lock(&self.core);
        for (descriptor, result) in snapshot.into_iter().zip(results) {
            match result {
                Ok(mut fetched) => {
                    report.succeeded += 1;
                    report.entries += fetched.entries.len();

                    match descriptor.resolve(&fetched) {
                        Some(next) => core.frontier.push(next),
                        None => {
                            debug!(origin = descriptor.origin(), "source exhausted");
                            report.exhausted += 1;
                        }
                    }

                    for entry in &mut fetched.entries {
                        entry.tag_origin(descriptor.origin());
                    }
                    core.buffer.extend(fetched.entries);
                }
                Err(err) => {
                    warn!(
                        origin = descriptor.origin(),
                        url = err.url(),
                        error = %err,
                        "fetch failed, dropping source"
                    );
                    report.failed += 1;
                }
            }
        }
        core.buffer.sort();
        core.page += 1;
        report.buffered = core.buffer.len();
        report.active = core.frontier.len();
        drop(core);

        debug!(
            page = report.page,
            requested = report.requested,
            succeeded = report.succeeded,
            failed = report.failed,
            exhausted = report.exhausted,
            fetched = report.entries,
            buffered = report.buffered,
            active = report.active,
            "fetch cycle finished"
        );
        self.renderer.cycle_finished(&report);
        Some(report)
    }
}

impl<F, R> LoadController<F, R>
where
    F: PageFetcher + 'static,
    R: Renderer + 'static,
{
    /// Run `render_more` in the background.
    ///
    /// Returns `false` when the controller is busy or exhausted and nothing
    /// was spawned.  Triggers are coalesced, not queued.
    pub fn trigger(self: &Arc<Self>, runtime: &tokio::runtime::Handle) -> bool {
        if self.phase() != Phase::Idle {
            return false;
        }
        let controller = Arc::clone(self);
        runtime.spawn(async move {
            match controller.render_more().await {
                Outcome::Rendered { count, refilled } => {
                    debug!(count, refilled, "rendered batch");
                }
                other => debug!(outcome = ?other, "nothing rendered"),
            }
        });
        true
    }
}
