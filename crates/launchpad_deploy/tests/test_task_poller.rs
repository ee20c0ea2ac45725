use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use launchpad_deploy::backend::{BackendError, JobStatusSource};
use launchpad_deploy::job::{DeploymentJob, JobStatus, ManualClock};
use launchpad_deploy::poller::{PollCallbacks, PollPolicy, Subscription, TaskPoller};
use parking_lot::Mutex;

/// Serves queued responses in order, repeating the last one forever.
struct ScriptedJobs {
    responses: Mutex<VecDeque<Result<DeploymentJob, BackendError>>>,
    last: Mutex<Option<Result<DeploymentJob, BackendError>>>,
    calls: AtomicUsize,
}

impl ScriptedJobs {
    fn new(responses: Vec<Result<DeploymentJob, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobStatusSource for ScriptedJobs {
    async fn job_status(&self, _job_id: &str) -> Result<DeploymentJob, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().pop_front();
        match next {
            Some(response) => {
                *self.last.lock() = Some(response.clone());
                response
            }
            None => self
                .last
                .lock()
                .clone()
                .unwrap_or_else(|| Err(BackendError::NotFound("job".into()))),
        }
    }
}

fn job(status: JobStatus, percentage: u8) -> Result<DeploymentJob, BackendError> {
    Ok(DeploymentJob {
        id: "task-1".into(),
        status,
        percentage,
        message: format!("{percentage}% done"),
        started_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()),
    })
}

fn counters() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
}

fn counting_callbacks(done: &Arc<AtomicUsize>, failed: &Arc<AtomicUsize>) -> PollCallbacks {
    let done = Arc::clone(done);
    let failed = Arc::clone(failed);
    PollCallbacks::new()
        .on_complete(move |_| {
            done.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |_| {
            failed.fetch_add(1, Ordering::SeqCst);
        })
}

#[tokio::test(start_paused = true)]
async fn complete_on_first_tick_fires_once_and_stops() {
    let source = ScriptedJobs::new(vec![job(JobStatus::Running, 100)]);
    let poller = TaskPoller::new(source.clone());
    let (done, failed) = counters();

    let sub = poller.start("task-1", PollPolicy::default(), counting_callbacks(&done, &failed));
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(source.call_count(), 1);
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(failed.load(Ordering::SeqCst), 0);
    assert!(!sub.is_active());
    let progress = sub.progress();
    assert!(progress.finished);
    assert_eq!(progress.percentage, 100);
}

#[tokio::test(start_paused = true)]
async fn running_job_ticks_until_cancelled() {
    let source = ScriptedJobs::new(vec![job(JobStatus::Running, 40)]);
    let poller = TaskPoller::new(source.clone());
    let (done, failed) = counters();

    let sub = poller.start("task-1", PollPolicy::default(), counting_callbacks(&done, &failed));
    // Fetches at 0s, 2s, 4s and 6s.
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert_eq!(source.call_count(), 4);
    assert!(sub.is_active());

    sub.cancel();
    sub.cancel();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(source.call_count(), 4);
    assert!(!sub.is_active());
    assert_eq!(done.load(Ordering::SeqCst), 0);
    assert_eq!(failed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_subscription_cancels() {
    let source = ScriptedJobs::new(vec![job(JobStatus::Pending, 0)]);
    let poller = TaskPoller::new(source.clone());

    let sub = poller.start("task-1", PollPolicy::default(), PollCallbacks::new());
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(sub);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(source.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_status_fires_on_error_once() {
    let source = ScriptedJobs::new(vec![job(JobStatus::Running, 30), job(JobStatus::Failed, 30)]);
    let poller = TaskPoller::new(source.clone());
    let (done, failed) = counters();

    let sub = poller.start("task-1", PollPolicy::default(), counting_callbacks(&done, &failed));
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(source.call_count(), 2);
    assert_eq!(failed.load(Ordering::SeqCst), 1);
    assert_eq!(done.load(Ordering::SeqCst), 0);
    assert_eq!(sub.progress().status, JobStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_are_tolerated() {
    let source = ScriptedJobs::new(vec![
        Err(BackendError::Transport("timeout".into())),
        Err(BackendError::Transport("timeout".into())),
        job(JobStatus::Completed, 100),
    ]);
    let poller = TaskPoller::new(source.clone());
    let (done, failed) = counters();

    let sub = poller.start("task-1", PollPolicy::default(), counting_callbacks(&done, &failed));
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert!(sub.progress().last_error.unwrap().contains("timeout"));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(done.load(Ordering::SeqCst), 1);
    assert_eq!(failed.load(Ordering::SeqCst), 0);
    assert!(sub.progress().last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn consecutive_failure_limit_terminates() {
    let source = ScriptedJobs::new(vec![Err(BackendError::Transport("refused".into()))]);
    let poller = TaskPoller::new(source.clone());
    let (done, failed) = counters();
    let policy = PollPolicy {
        interval: Duration::from_secs(1),
        max_consecutive_failures: Some(3),
    };

    let sub = poller.start("task-1", policy, counting_callbacks(&done, &failed));
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(source.call_count(), 3);
    assert_eq!(failed.load(Ordering::SeqCst), 1);
    assert!(!sub.is_active());
}

#[tokio::test(start_paused = true)]
async fn elapsed_uses_injected_clock() {
    let source = ScriptedJobs::new(vec![job(JobStatus::Running, 10)]);
    let started = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(started));
    let poller = TaskPoller::with_clock(source, clock.clone());

    let sub = poller.start("task-1", PollPolicy::default(), PollCallbacks::new());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(sub.elapsed_label(), "00:00");

    clock.advance(Duration::from_secs(65));
    assert_eq!(sub.elapsed_label(), "01:05");
    sub.cancel();
}

#[tokio::test(start_paused = true)]
async fn updates_are_reported_each_tick() {
    let source = ScriptedJobs::new(vec![
        job(JobStatus::Running, 20),
        job(JobStatus::Running, 60),
        job(JobStatus::Completed, 100),
    ]);
    let poller = TaskPoller::new(source);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let _sub = poller.start(
        "task-1",
        PollPolicy::default(),
        PollCallbacks::new().on_update(move |p| sink.lock().push(p.percentage)),
    );
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(*seen.lock(), vec![20, 60, 100]);
}

/// Cancels the watching subscription while its fetch is in flight.
struct CancelsMidFetch {
    subscription: Mutex<Option<Subscription>>,
}

#[async_trait]
impl JobStatusSource for CancelsMidFetch {
    async fn job_status(&self, _job_id: &str) -> Result<DeploymentJob, BackendError> {
        if let Some(subscription) = self.subscription.lock().as_ref() {
            subscription.cancel();
        }
        job(JobStatus::Running, 40)
    }
}

#[tokio::test(start_paused = true)]
async fn cancel_during_fetch_suppresses_update() {
    let source = Arc::new(CancelsMidFetch {
        subscription: Mutex::new(None),
    });
    let updates = Arc::new(AtomicUsize::new(0));
    let (done, failed) = counters();
    let seen = Arc::clone(&updates);
    let callbacks = counting_callbacks(&done, &failed).on_update(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let poller = TaskPoller::new(source.clone());
    let subscription = poller.start("task-1", PollPolicy::default(), callbacks);
    *source.subscription.lock() = Some(subscription);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(updates.load(Ordering::SeqCst), 0);
    assert_eq!(done.load(Ordering::SeqCst), 0);
    assert_eq!(failed.load(Ordering::SeqCst), 0);
    let subscription = source.subscription.lock().take();
    assert!(!subscription.is_some_and(|s| s.is_active()));
}
