//! The boundary between the load controller and the screen.
//!
//! The controller runs on the tokio runtime; the UI loop runs on the main
//! thread.  [`ChannelRenderer`] bridges the two by sending [`StreamMsg`]s over
//! an [`mpsc`] channel that the main loop drains on every tick.

use std::sync::mpsc;

use crate::controller::CycleReport;
use crate::source::Entry;

/// Consumer of rendered batches.
///
/// `render` is only called with a non-empty batch that is already in display
/// order.  It must append, never re-render, and must not call back into the
/// controller.
pub trait Renderer: Send + Sync {
    fn render(&self, entries: Vec<Entry>);

    /// The stream has ended for good.  Called at most once.
    fn exhausted(&self);

    /// Bookkeeping after each fetch cycle.
    fn cycle_finished(&self, _report: &CycleReport) {}
}

/// Messages sent from the load controller to the UI thread.
#[derive(Debug)]
pub enum StreamMsg {
    /// A batch to append to the list.
    Entries(Vec<Entry>),
    /// A fetch cycle finished.
    Cycle(CycleReport),
    /// No more content can be loaded in this session.
    Exhausted,
}

pub struct ChannelRenderer {
    tx: mpsc::Sender<StreamMsg>,
}

impl ChannelRenderer {
    /// Create a renderer and the receiver the UI loop should drain.
    pub fn channel() -> (Self, mpsc::Receiver<StreamMsg>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, msg: StreamMsg) {
        // The receiver is gone once its session was replaced; nobody is
        // listening any more, so drop the message.
        let _ = self.tx.send(msg);
    }
}

impl Renderer for ChannelRenderer {
    fn render(&self, entries: Vec<Entry>) {
        self.send(StreamMsg::Entries(entries));
    }

    fn exhausted(&self) {
        self.send(StreamMsg::Exhausted);
    }

    fn cycle_finished(&self, report: &CycleReport) {
        self.send(StreamMsg::Cycle(report.clone()));
    }
}
