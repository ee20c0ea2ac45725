use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use launchpad_core::ConsoleConfig;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::JobStatusSource;
use crate::job::{Clock, JobOutcome, SystemClock, TaskProgress};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// How a job is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Give up after this many failed fetches in a row. `None` never gives up.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_failures: None,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_consecutive_failures: None,
        }
        .with_max_failures(config.max_consecutive_poll_failures)
    }

    /// Override the failure limit. `Some(0)` means no limit, as in the config file.
    pub fn with_max_failures(mut self, max: Option<u32>) -> Self {
        self.max_consecutive_failures = max.filter(|&n| n > 0);
        self
    }
}

type TerminalCallback = Box<dyn FnOnce(&TaskProgress) + Send>;
type UpdateCallback = Box<dyn Fn(&TaskProgress) + Send>;

/// Hooks invoked from the polling task. `on_complete` and `on_error` run at
/// most once per subscription, and never after `cancel()`.
#[derive(Default)]
pub struct PollCallbacks {
    on_update: Option<UpdateCallback>,
    on_complete: Option<TerminalCallback>,
    on_error: Option<TerminalCallback>,
}

impl PollCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_update(mut self, f: impl Fn(&TaskProgress) + Send + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(&TaskProgress) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(&TaskProgress) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

struct PollShared {
    progress: Mutex<TaskProgress>,
    stopped: AtomicBool,
}

/// Polls deployment jobs until they finish or are cancelled.
pub struct TaskPoller {
    source: Arc<dyn JobStatusSource>,
    clock: Arc<dyn Clock>,
}

impl TaskPoller {
    pub fn new(source: Arc<dyn JobStatusSource>) -> Self {
        Self::with_clock(source, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn JobStatusSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    /// Start polling `job_id`. The first fetch happens immediately; each later
    /// fetch starts one interval after the previous one finished.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, job_id: impl Into<String>, policy: PollPolicy, callbacks: PollCallbacks) -> Subscription {
        let job_id = job_id.into();
        let shared = Arc::new(PollShared {
            progress: Mutex::new(TaskProgress::new(job_id.clone())),
            stopped: AtomicBool::new(false),
        });

        info!(job_id = %job_id, interval_ms = policy.interval.as_millis() as u64, "polling job");
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.source),
            job_id.clone(),
            policy,
            callbacks,
            Arc::clone(&shared),
        ));

        Subscription {
            job_id,
            shared,
            handle: Mutex::new(Some(handle)),
            clock: Arc::clone(&self.clock),
        }
    }
}

async fn poll_loop(
    source: Arc<dyn JobStatusSource>,
    job_id: String,
    policy: PollPolicy,
    mut callbacks: PollCallbacks,
    shared: Arc<PollShared>,
) {
    let mut failures: u32 = 0;
    loop {
        if shared.stopped.load(Ordering::SeqCst) {
            return;
        }

        match source.job_status(&job_id).await {
            Ok(job) => {
                failures = 0;
                let snapshot = {
                    let mut progress = shared.progress.lock();
                    progress.apply(&job);
                    progress.clone()
                };
                debug!(job_id = %job_id, status = job.status.as_str(), percentage = job.percentage, "job update");
                // Cancelled while the fetch was in flight.
                if shared.stopped.load(Ordering::SeqCst) {
                    return;
                }
                if let Some(on_update) = &callbacks.on_update {
                    on_update(&snapshot);
                }
                if let Some(outcome) = job.outcome() {
                    finish(&shared, &mut callbacks, outcome);
                    return;
                }
            }
            Err(e) => {
                failures += 1;
                warn!(job_id = %job_id, error = %e, failures, "job status fetch failed");
                shared.progress.lock().last_error = Some(e.to_string());
                let exhausted = policy
                    .max_consecutive_failures
                    .is_some_and(|max| failures >= max);
                if exhausted {
                    finish(&shared, &mut callbacks, JobOutcome::Failed);
                    return;
                }
            }
        }

        tokio::time::sleep(policy.interval).await;
    }
}

/// Mark the subscription finished and fire the matching callback, unless
/// `cancel()` got there first.
fn finish(shared: &PollShared, callbacks: &mut PollCallbacks, outcome: JobOutcome) {
    if shared.stopped.swap(true, Ordering::SeqCst) {
        return;
    }
    let snapshot = {
        let mut progress = shared.progress.lock();
        progress.finished = true;
        progress.clone()
    };
    info!(job_id = %snapshot.job_id, ?outcome, "job finished");
    let callback = match outcome {
        JobOutcome::Succeeded => callbacks.on_complete.take(),
        JobOutcome::Failed => callbacks.on_error.take(),
    };
    if let Some(callback) = callback {
        callback(&snapshot);
    }
}

/// Handle to a running poll. Dropping it cancels the poll.
pub struct Subscription {
    job_id: String,
    shared: Arc<PollShared>,
    handle: Mutex<Option<JoinHandle<()>>>,
    clock: Arc<dyn Clock>,
}

impl Subscription {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop polling now. No callback fires afterwards. Safe to call repeatedly.
    pub fn cancel(&self) {
        let was_stopped = self.shared.stopped.swap(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            if !was_stopped {
                debug!(job_id = %self.job_id, "job polling cancelled");
            }
        }
    }

    /// False once the job finished or the subscription was cancelled.
    pub fn is_active(&self) -> bool {
        !self.shared.stopped.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> TaskProgress {
        self.shared.progress.lock().clone()
    }

    /// Elapsed time since the job started, as `mm:ss`, at the clock's current
    /// time rather than the last poll.
    pub fn elapsed_label(&self) -> String {
        self.shared.progress.lock().elapsed_label(self.clock.now())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
