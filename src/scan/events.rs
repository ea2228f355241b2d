//! Scan lifecycle events
//!
//! The scanner reports progress through an event channel handed to it at
//! construction. Consumers (the CLI, tests) receive every lifecycle
//! transition; the scanner itself never blocks on a slow consumer.

use crate::TaskError;
use tokio::sync::mpsc;
use url::Url;

/// Which phase of the download-then-parse pipeline a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Download,
    Parse,
}

/// One observable scan lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// The scan has started; the starting URL is about to be dispatched
    Started,

    /// A task began executing
    TaskStarted { url: Url, kind: TaskKind },

    /// A task ended in failure (including cancellation)
    TaskFailed { url: Url, error: TaskError },

    /// A page was fully processed; `matches` occurrences of the search term
    /// were found in its body text
    TaskFinished { url: Url, matches: usize },

    /// All work is done: nothing queued, nothing running
    Finished,

    /// The scan was canceled; no further admissions will happen
    Canceled,
}

/// Sending half of the scan event channel
#[derive(Debug, Clone)]
pub struct ScanEvents {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ScanEvents {
    pub fn new(tx: mpsc::UnboundedSender<ScanEvent>) -> Self {
        Self { tx }
    }

    /// Emits an event; a dropped receiver is not an error
    pub(crate) fn emit(&self, event: ScanEvent) {
        let _ = self.tx.send(event);
    }
}
