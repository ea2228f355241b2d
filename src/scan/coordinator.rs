//! Scan coordinator - main crawl orchestration logic
//!
//! The [`Scanner`] wires the frontier, the scheduler, and the task lifecycle
//! into a self-sustaining loop: an admitted URL becomes a download task, a
//! successful download becomes a parse task, a successful parse feeds newly
//! discovered links back through frontier admission, and every admitted link
//! becomes a new download task. The loop winds down on its own once the
//! budget chokes off admissions and the remaining tasks finish.
//!
//! Follow-up tasks are submitted inside the predecessor's completion closure,
//! which runs before the scheduler releases the predecessor's pending slot.
//! The scheduler's idle signal is therefore exact: it fires only when no task
//! exists and none can appear.

use crate::config::Config;
use crate::fetch::Fetch;
use crate::scan::events::{ScanEvent, ScanEvents};
use crate::scan::frontier::Frontier;
use crate::scan::scheduler::Scheduler;
use crate::scan::task::{CrawlTask, TaskOutput};
use crate::url::normalize_url;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Orchestrates one scan session from the starting URL to idle
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct Scanner {
    inner: Arc<ScanInner>,
}

struct ScanInner {
    search_term: String,
    starting_url: Url,
    fetcher: Arc<dyn Fetch>,
    frontier: Frontier,
    scheduler: Scheduler,
    events: ScanEvents,
    cancel_once: AtomicBool,
    canceled: CancellationToken,
}

impl Scanner {
    /// Creates a scanner for one session
    ///
    /// The scheduler is created suspended; nothing runs until
    /// [`Scanner::start`]. Must be called inside a tokio runtime.
    ///
    /// # Arguments
    ///
    /// * `config` - Immutable scan settings
    /// * `fetcher` - Transport capability used by download tasks
    /// * `events` - Channel receiving every lifecycle event of the session
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn Fetch>,
        events: mpsc::UnboundedSender<ScanEvent>,
    ) -> Result<Self> {
        let starting_url = normalize_url(&config.scan.starting_url)?;

        let inner = Arc::new(ScanInner {
            search_term: config.scan.search_term.clone(),
            starting_url,
            fetcher,
            frontier: Frontier::new(config.scan.max_urls),
            scheduler: Scheduler::new(config.scan.worker_count as usize, true),
            events: ScanEvents::new(events),
            cancel_once: AtomicBool::new(false),
            canceled: CancellationToken::new(),
        });

        Ok(Self { inner })
    }

    /// Starts the scan
    ///
    /// Emits `Started` and seeds the frontier with the starting URL while the
    /// scheduler is still suspended, then resumes it. The first download can
    /// therefore never finish before the start event is observable.
    pub fn start(&self) {
        tracing::info!("Starting scan at {}", self.inner.starting_url);
        self.inner.events.emit(ScanEvent::Started);

        let seed = self.inner.starting_url.clone();
        for url in self.inner.frontier.try_admit(vec![seed]) {
            self.inner.submit_download(url);
        }

        self.inner.scheduler.resume();
    }

    /// Resolves once the scan is over
    ///
    /// Emits `Finished` when the scheduler goes idle; returns without it if
    /// the scan was canceled first.
    pub async fn wait(&self) {
        tokio::select! {
            _ = self.inner.scheduler.wait_idle() => {
                if !self.inner.canceled.is_cancelled() {
                    tracing::info!(
                        "Scan finished: {} URLs admitted",
                        self.inner.frontier.admitted_count()
                    );
                    self.inner.events.emit(ScanEvent::Finished);
                }
            }
            _ = self.inner.canceled.cancelled() => {}
        }
    }

    /// Runs the scan to completion
    pub async fn run(&self) {
        self.start();
        self.wait().await;
    }

    /// Stops dispatching new tasks; in-flight tasks finish, queued tasks and
    /// frontier state are kept
    pub fn pause(&self) {
        tracing::debug!("Scan paused");
        self.inner.scheduler.pause();
    }

    /// Resumes dispatching after a pause
    pub fn resume(&self) {
        tracing::debug!("Scan resumed");
        self.inner.scheduler.resume();
    }

    /// Cancels the scan; not resumable afterward
    ///
    /// Queued tasks transition to canceled, in-flight downloads are aborted,
    /// and no admission happens after this call, however late a response
    /// arrives. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancel_once.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!("Scan canceled");
        self.inner.canceled.cancel();
        self.inner.events.emit(ScanEvent::Canceled);
        self.inner.scheduler.cancel_all();
    }

    /// Number of URLs admitted so far
    pub fn admitted_count(&self) -> usize {
        self.inner.frontier.admitted_count()
    }

    /// True when no task is queued or running
    pub fn is_idle(&self) -> bool {
        self.inner.scheduler.is_idle()
    }
}

impl ScanInner {
    /// Enqueues the download task for an admitted URL
    fn submit_download(self: &Arc<Self>, url: Url) {
        let inner = Arc::clone(self);
        let page_url = url.clone();

        let (task, _handle) = CrawlTask::download(
            url,
            Arc::clone(&self.fetcher),
            self.events.clone(),
            self.scheduler.task_token(),
            Box::new(move |outcome| {
                if let Ok(TaskOutput::Download(body)) = outcome {
                    inner.submit_parse(page_url, body);
                }
            }),
        );

        self.scheduler.submit(task);
    }

    /// Enqueues the parse task for a downloaded page
    fn submit_parse(self: &Arc<Self>, url: Url, body: Vec<u8>) {
        if self.canceled.is_cancelled() {
            return;
        }

        // Link extraction is pointless once the budget is spent; the page is
        // still searched for the term.
        let scan_links = self.frontier.has_capacity();
        let inner = Arc::clone(self);

        let (task, _handle) = CrawlTask::parse(
            url,
            body,
            self.search_term.clone(),
            scan_links,
            self.events.clone(),
            self.scheduler.task_token(),
            Box::new(move |outcome| {
                if let Ok(TaskOutput::Parse(extraction)) = outcome {
                    inner.admit_discovered(extraction.links);
                }
            }),
        );

        self.scheduler.submit(task);
    }

    /// Runs discovered links through frontier admission and spawns a download
    /// per admitted URL
    fn admit_discovered(self: &Arc<Self>, links: Vec<Url>) {
        if self.canceled.is_cancelled() {
            return;
        }

        let candidates: Vec<Url> = links
            .iter()
            .filter_map(|link| match normalize_url(link.as_str()) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!("Dropping unusable link {}: {}", link, e);
                    None
                }
            })
            .collect();

        let admitted = self.frontier.try_admit(candidates);
        if !admitted.is_empty() {
            tracing::debug!(
                "Admitted {} new URLs ({} total)",
                admitted.len(),
                self.frontier.admitted_count()
            );
        }

        for url in admitted {
            self.submit_download(url);
        }
    }
}
