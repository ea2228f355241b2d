//! The crawl engine
//!
//! This module contains the core of pagegrep:
//! - the URL frontier with deduplication and budget enforcement
//! - the crawl task state machine (download, then parse)
//! - the fixed-size task scheduler with pause/resume and cancellation
//! - the scan coordinator wiring all of it into a self-sustaining loop

mod coordinator;
mod events;
mod frontier;
mod scheduler;
mod task;

pub use coordinator::Scanner;
pub use events::{ScanEvent, ScanEvents, TaskKind};
pub use frontier::Frontier;
pub use scheduler::Scheduler;
pub use task::{CrawlTask, TaskHandle, TaskOutcome, TaskOutput};

use crate::config::Config;
use crate::fetch::{Fetch, HttpFetcher};
use crate::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs a complete scan over HTTP
///
/// Builds the fetcher from the transport configuration, runs the scan to
/// completion, and returns the scanner so the caller can inspect final
/// counts. Callers that need to pause or cancel mid-scan construct a
/// [`Scanner`] themselves and keep a clone.
///
/// # Arguments
///
/// * `config` - The scan configuration
/// * `events` - Channel receiving every lifecycle event
pub async fn run_scan(
    config: &Config,
    events: mpsc::UnboundedSender<ScanEvent>,
) -> Result<Scanner> {
    let fetcher: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(&config.transport)?);
    let scanner = Scanner::new(config, fetcher, events)?;
    scanner.run().await;
    Ok(scanner)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared helpers for the scan module's tests

    use crate::fetch::Fetch;
    use crate::scan::events::ScanEvent;
    use crate::TransportError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::mpsc;
    use url::Url;

    /// Serves canned pages from memory; unknown URLs fail like a 404
    pub(crate) struct StaticFetcher {
        pages: HashMap<String, Vec<u8>>,
        fallback: Option<Vec<u8>>,
    }

    impl StaticFetcher {
        pub(crate) fn new() -> Self {
            Self {
                pages: HashMap::new(),
                fallback: None,
            }
        }

        pub(crate) fn with_page(mut self, url: &str, body: Vec<u8>) -> Self {
            self.pages.insert(url.to_string(), body);
            self
        }

        /// Serves `body` for every URL
        pub(crate) fn single(body: Vec<u8>) -> Self {
            Self {
                pages: HashMap::new(),
                fallback: Some(body),
            }
        }
    }

    #[async_trait]
    impl Fetch for StaticFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, TransportError> {
            if let Some(body) = self.pages.get(url.as_str()) {
                return Ok(body.clone());
            }
            match &self.fallback {
                Some(body) => Ok(body.clone()),
                None => Err(TransportError("HTTP 404".to_string())),
            }
        }
    }

    /// Never resolves; downloads hang until canceled
    pub(crate) struct HangingFetcher;

    #[async_trait]
    impl Fetch for HangingFetcher {
        async fn fetch(&self, _url: &Url) -> Result<Vec<u8>, TransportError> {
            std::future::pending().await
        }
    }

    /// Always fails with a connection error
    pub(crate) struct FailingFetcher;

    #[async_trait]
    impl Fetch for FailingFetcher {
        async fn fetch(&self, _url: &Url) -> Result<Vec<u8>, TransportError> {
            Err(TransportError("connection failed".to_string()))
        }
    }

    /// Drains everything currently buffered on an event channel
    pub(crate) fn collect_pending(rx: &mut mpsc::UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }
}
