//! Crawl task state machine
//!
//! A task is one unit of work for one URL: either the download phase or the
//! parse phase of the pipeline. A task moves `pending → running → terminal`
//! and makes exactly one terminal transition, whatever combination of
//! completion and cancellation races to it. The terminal transition emits one
//! observer event and invokes the task's completion closure exactly once.
//!
//! Cancellation is cooperative: canceling sets the task's token, which aborts
//! an in-flight fetch by dropping its future. Canceling a task that is
//! already terminal has no observable effect.

use crate::extract::{extract, Extraction};
use crate::fetch::Fetch;
use crate::scan::events::{ScanEvent, ScanEvents, TaskKind};
use crate::TaskError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Payload of a successful task
#[derive(Debug)]
pub enum TaskOutput {
    /// Raw bytes of the downloaded page
    Download(Vec<u8>),

    /// Links and match count extracted from the page
    Parse(Extraction),
}

/// Result of one task, produced exactly once
pub type TaskOutcome = Result<TaskOutput, TaskError>;

type CompletionFn = Box<dyn FnOnce(TaskOutcome) + Send + Sync>;

/// The work a task performs once a worker picks it up
enum TaskWork {
    Download {
        fetcher: Arc<dyn Fetch>,
    },
    Parse {
        body: Vec<u8>,
        search_term: String,
        scan_links: bool,
    },
}

/// One download or parse unit of work for a single URL
pub struct CrawlTask {
    url: Url,
    kind: TaskKind,
    work: TaskWork,
    cancel: CancellationToken,
    done: Arc<AtomicBool>,
    events: ScanEvents,
    on_terminal: CompletionFn,
}

/// Cancellation handle for a submitted task
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancel: CancellationToken,
    done: Arc<AtomicBool>,
}

impl TaskHandle {
    /// Requests cancellation; a no-op if the task is already terminal
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the task has made its terminal transition
    pub fn is_finished(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

impl CrawlTask {
    /// Creates a download task for `url`
    pub fn download(
        url: Url,
        fetcher: Arc<dyn Fetch>,
        events: ScanEvents,
        cancel: CancellationToken,
        on_terminal: CompletionFn,
    ) -> (Self, TaskHandle) {
        Self::new(url, TaskKind::Download, TaskWork::Download { fetcher }, events, cancel, on_terminal)
    }

    /// Creates a parse task for a page already downloaded from `url`
    ///
    /// `scan_links` reflects the frontier's remaining capacity at creation
    /// time: when the budget is already spent, the page is still searched for
    /// the term but link extraction is skipped.
    pub fn parse(
        url: Url,
        body: Vec<u8>,
        search_term: String,
        scan_links: bool,
        events: ScanEvents,
        cancel: CancellationToken,
        on_terminal: CompletionFn,
    ) -> (Self, TaskHandle) {
        let work = TaskWork::Parse {
            body,
            search_term,
            scan_links,
        };
        Self::new(url, TaskKind::Parse, work, events, cancel, on_terminal)
    }

    fn new(
        url: Url,
        kind: TaskKind,
        work: TaskWork,
        events: ScanEvents,
        cancel: CancellationToken,
        on_terminal: CompletionFn,
    ) -> (Self, TaskHandle) {
        let done = Arc::new(AtomicBool::new(false));
        let handle = TaskHandle {
            cancel: cancel.clone(),
            done: Arc::clone(&done),
        };
        let task = Self {
            url,
            kind,
            work,
            cancel,
            done,
            events,
            on_terminal,
        };
        (task, handle)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Executes the task to its terminal transition
    ///
    /// Every failure is captured into this task's outcome; nothing escapes to
    /// the worker running it.
    pub(crate) async fn run(self) {
        // A task canceled while still queued never starts
        if self.cancel.is_cancelled() {
            self.finish(Err(TaskError::Canceled));
            return;
        }

        self.events.emit(ScanEvent::TaskStarted {
            url: self.url.clone(),
            kind: self.kind,
        });

        let cancel = self.cancel.clone();
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(TaskError::Canceled),
            outcome = self.execute() => outcome,
        };

        self.finish(outcome);
    }

    async fn execute(&self) -> TaskOutcome {
        match &self.work {
            TaskWork::Download { fetcher } => {
                let bytes = fetcher.fetch(&self.url).await.map_err(TaskError::Transport)?;
                if bytes.is_empty() {
                    return Err(TaskError::NoData);
                }
                Ok(TaskOutput::Download(bytes))
            }
            TaskWork::Parse {
                body,
                search_term,
                scan_links,
            } => {
                let extraction = extract(body, &self.url, search_term, *scan_links)?;
                Ok(TaskOutput::Parse(extraction))
            }
        }
    }

    /// Makes the terminal transition, exactly once
    ///
    /// Later calls (a duplicate cancel, a drain racing a completion) return
    /// without any observable effect.
    pub(crate) fn finish(self, outcome: TaskOutcome) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }

        match &outcome {
            Err(error) => self.events.emit(ScanEvent::TaskFailed {
                url: self.url.clone(),
                error: error.clone(),
            }),
            Ok(TaskOutput::Parse(extraction)) => self.events.emit(ScanEvent::TaskFinished {
                url: self.url.clone(),
                matches: extraction.matches,
            }),
            // A successful download is an intermediate step; the parse task
            // reports for the page.
            Ok(TaskOutput::Download(_)) => {}
        }

        (self.on_terminal)(outcome);
    }
}
