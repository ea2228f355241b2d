//! Task scheduler: a fixed pool of workers over a FIFO queue
//!
//! The scheduler owns queued tasks and runs them on `worker_count` tokio
//! tasks. It supports cooperative suspension (queued work is held, in-flight
//! work runs to completion), bulk cancellation (queue drained to canceled,
//! in-flight tasks aborted through their tokens), and exact idle detection
//! through a pending counter covering queued and running tasks.
//!
//! The pending count for a task is released only after its terminal
//! transition *and* its completion closure have run, so any follow-up work a
//! completion submits is counted before its predecessor is uncounted. The
//! count therefore reaches zero exactly when no task exists and none can be
//! created by in-flight completions.

use crate::scan::task::CrawlTask;
use crate::TaskError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Semaphore};
use tokio_util::sync::CancellationToken;

/// Bounded worker pool executing crawl tasks
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    state: Mutex<SchedState>,
    /// One permit per queued task
    work: Semaphore,
    suspended_tx: watch::Sender<bool>,
    /// Queued + running task count; zero means idle
    pending_tx: watch::Sender<usize>,
    shutdown: CancellationToken,
}

struct SchedState {
    queue: VecDeque<CrawlTask>,
    suspended: bool,
}

impl Scheduler {
    /// Creates a scheduler and spawns its workers
    ///
    /// Workers are spawned onto the current tokio runtime immediately; when
    /// `start_suspended` is true they hold off executing queued tasks until
    /// [`Scheduler::resume`] is called.
    pub fn new(worker_count: usize, start_suspended: bool) -> Self {
        let (suspended_tx, _) = watch::channel(start_suspended);
        let (pending_tx, _) = watch::channel(0usize);

        let inner = Arc::new(SchedulerInner {
            state: Mutex::new(SchedState {
                queue: VecDeque::new(),
                suspended: start_suspended,
            }),
            work: Semaphore::new(0),
            suspended_tx,
            pending_tx,
            shutdown: CancellationToken::new(),
        });

        for _ in 0..worker_count {
            tokio::spawn(worker_loop(Arc::clone(&inner)));
        }

        Self { inner }
    }

    /// Returns a cancellation token for one task, tied to the pool
    ///
    /// Canceling the pool cancels every token handed out here.
    pub fn task_token(&self) -> CancellationToken {
        self.inner.shutdown.child_token()
    }

    /// Enqueues a task; it runs as soon as a worker is free and the pool is
    /// not suspended
    ///
    /// After [`Scheduler::cancel_all`] the pool accepts no further work; a
    /// task submitted then makes its terminal transition to canceled
    /// immediately.
    pub fn submit(&self, task: CrawlTask) {
        {
            let mut state = self.lock_state();
            if !self.inner.shutdown.is_cancelled() {
                self.inner.pending_tx.send_modify(|pending| *pending += 1);
                state.queue.push_back(task);
                self.inner.work.add_permits(1);
                return;
            }
        }

        task.finish(Err(TaskError::Canceled));
    }

    /// Stops dispatching queued tasks; in-flight tasks run to completion
    pub fn pause(&self) {
        let mut state = self.lock_state();
        state.suspended = true;
        self.inner.suspended_tx.send_replace(true);
    }

    /// Resumes dispatching queued tasks
    pub fn resume(&self) {
        let mut state = self.lock_state();
        state.suspended = false;
        self.inner.suspended_tx.send_replace(false);
    }

    /// Cancels every queued and running task and shuts the pool down
    ///
    /// Queued tasks transition to canceled here; running tasks observe their
    /// token and transition on their own. Idempotent.
    pub fn cancel_all(&self) {
        self.inner.shutdown.cancel();

        let drained: Vec<CrawlTask> = {
            let mut state = self.lock_state();
            state.queue.drain(..).collect()
        };

        // Terminal transitions run outside the lock; a completion closure may
        // re-enter the scheduler.
        for task in drained {
            task.finish(Err(TaskError::Canceled));
            release_pending(&self.inner);
        }
    }

    /// True when no task is queued or running
    pub fn is_idle(&self) -> bool {
        *self.inner.pending_tx.borrow() == 0
    }

    /// Number of queued plus running tasks
    pub fn pending_count(&self) -> usize {
        *self.inner.pending_tx.borrow()
    }

    /// Resolves once no task is queued or running
    pub async fn wait_idle(&self) {
        let mut pending_rx = self.inner.pending_tx.subscribe();
        let _ = pending_rx.wait_for(|pending| *pending == 0).await;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SchedState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        // Workers hold the inner Arc; release them when the pool goes away.
        self.inner.shutdown.cancel();
    }
}

/// Releases one task's slot in the pending count
fn release_pending(inner: &SchedulerInner) {
    inner
        .pending_tx
        .send_modify(|pending| *pending = pending.saturating_sub(1));
}

async fn worker_loop(inner: Arc<SchedulerInner>) {
    let mut suspended_rx = inner.suspended_tx.subscribe();

    loop {
        // Hold here while the pool is suspended
        tokio::select! {
            _ = inner.shutdown.cancelled() => return,
            result = suspended_rx.wait_for(|suspended| !*suspended) => {
                if result.is_err() {
                    return;
                }
            }
        }

        // Wait for a queued task
        let permit = tokio::select! {
            _ = inner.shutdown.cancelled() => return,
            permit = inner.work.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return,
            },
        };
        permit.forget();

        let task = {
            let mut state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.suspended {
                None
            } else {
                state.queue.pop_front()
            }
        };

        let Some(task) = task else {
            // Paused between wakeup and pop, or the queue was drained by
            // cancel_all. Return the permit and re-evaluate from the top.
            inner.work.add_permits(1);
            continue;
        };

        // Any failure is captured inside the task; it cannot take the worker
        // or a sibling task down.
        task.run().await;
        release_pending(&inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::events::ScanEvents;
    use crate::scan::task::{TaskOutcome, TaskOutput};
    use crate::scan::testing::{FailingFetcher, HangingFetcher, StaticFetcher};
    use crate::fetch::Fetch;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use url::Url;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn events() -> ScanEvents {
        let (tx, _rx) = mpsc::unbounded_channel();
        // Receiver intentionally dropped; these tests watch outcomes instead.
        ScanEvents::new(tx)
    }

    /// Builds a download task whose outcome lands on the returned channel
    fn download_task(
        scheduler: &Scheduler,
        target: &str,
        fetcher: Arc<dyn Fetch>,
    ) -> (CrawlTask, mpsc::UnboundedReceiver<TaskOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (task, _handle) = CrawlTask::download(
            url(target),
            fetcher,
            events(),
            scheduler.task_token(),
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        (task, rx)
    }

    #[tokio::test]
    async fn test_submitted_task_runs() {
        let scheduler = Scheduler::new(2, false);
        let (task, mut rx) = download_task(
            &scheduler,
            "http://a.test/",
            Arc::new(StaticFetcher::single(b"hello".to_vec())),
        );

        scheduler.submit(task);
        let outcome = rx.recv().await.unwrap();
        assert!(matches!(outcome, Ok(TaskOutput::Download(_))));

        scheduler.wait_idle().await;
        assert!(scheduler.is_idle());
    }

    #[tokio::test]
    async fn test_new_scheduler_is_idle() {
        let scheduler = Scheduler::new(1, false);
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_suspended_pool_holds_queued_work() {
        let scheduler = Scheduler::new(2, true);
        let (task, mut rx) = download_task(
            &scheduler,
            "http://a.test/",
            Arc::new(StaticFetcher::single(b"hello".to_vec())),
        );

        scheduler.submit(task);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.pending_count(), 1);

        scheduler.resume();
        assert!(rx.recv().await.unwrap().is_ok());
        scheduler.wait_idle().await;
    }

    #[tokio::test]
    async fn test_pause_then_resume() {
        let scheduler = Scheduler::new(1, false);
        scheduler.pause();

        let (task, mut rx) = download_task(
            &scheduler,
            "http://a.test/",
            Arc::new(StaticFetcher::single(b"hello".to_vec())),
        );
        scheduler.submit(task);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());

        scheduler.resume();
        assert!(rx.recv().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_cancel_all_cancels_queued_and_running() {
        let scheduler = Scheduler::new(1, false);

        // First task occupies the only worker indefinitely
        let (hanging, mut hanging_rx) =
            download_task(&scheduler, "http://a.test/", Arc::new(HangingFetcher));
        // Second task never leaves the queue
        let (queued, mut queued_rx) = download_task(
            &scheduler,
            "http://b.test/",
            Arc::new(StaticFetcher::single(b"hello".to_vec())),
        );

        scheduler.submit(hanging);
        scheduler.submit(queued);
        tokio::time::sleep(Duration::from_millis(20)).await;

        scheduler.cancel_all();

        assert_eq!(
            hanging_rx.recv().await.unwrap().unwrap_err(),
            TaskError::Canceled
        );
        assert_eq!(
            queued_rx.recv().await.unwrap().unwrap_err(),
            TaskError::Canceled
        );

        scheduler.wait_idle().await;
        assert!(scheduler.is_idle());
    }

    #[tokio::test]
    async fn test_submit_after_cancel_all_is_canceled() {
        let scheduler = Scheduler::new(1, false);
        scheduler.cancel_all();

        let (task, mut rx) = download_task(
            &scheduler,
            "http://a.test/",
            Arc::new(StaticFetcher::single(b"hello".to_vec())),
        );
        scheduler.submit(task);

        assert_eq!(rx.recv().await.unwrap().unwrap_err(), TaskError::Canceled);
        assert!(scheduler.is_idle());
    }

    #[tokio::test]
    async fn test_one_failing_task_does_not_affect_siblings() {
        let scheduler = Scheduler::new(2, false);

        let (failing, mut failing_rx) =
            download_task(&scheduler, "http://a.test/", Arc::new(FailingFetcher));
        let (healthy, mut healthy_rx) = download_task(
            &scheduler,
            "http://b.test/",
            Arc::new(StaticFetcher::single(b"hello".to_vec())),
        );

        scheduler.submit(failing);
        scheduler.submit(healthy);

        assert!(failing_rx.recv().await.unwrap().is_err());
        assert!(healthy_rx.recv().await.unwrap().is_ok());
        scheduler.wait_idle().await;
    }

    #[tokio::test]
    async fn test_pending_counts_queued_and_running() {
        let scheduler = Scheduler::new(1, false);

        let (hanging, _hanging_rx) =
            download_task(&scheduler, "http://a.test/", Arc::new(HangingFetcher));
        let (queued, _queued_rx) = download_task(
            &scheduler,
            "http://b.test/",
            Arc::new(StaticFetcher::single(b"hello".to_vec())),
        );

        scheduler.submit(hanging);
        scheduler.submit(queued);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(scheduler.pending_count(), 2);
        assert!(!scheduler.is_idle());

        scheduler.cancel_all();
        scheduler.wait_idle().await;
    }
}
