use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Job status
// ---------------------------------------------------------------------------

/// Backend job status. Parsing is lenient: the backend reports both
/// `completed`/`success` and `failed`/`error` depending on the job type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Unknown,
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Self::Pending,
            "running" | "in_progress" | "inprogress" => Self::Running,
            "completed" | "success" | "succeeded" => Self::Completed,
            "failed" | "error" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
}

// ---------------------------------------------------------------------------
// DeploymentJob
// ---------------------------------------------------------------------------

/// A backend deployment job as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentJob {
    pub id: String,
    pub status: JobStatus,
    /// Clamped to 0..=100 on the way in.
    #[serde(default, deserialize_with = "deserialize_percentage")]
    pub percentage: u8,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
}

impl DeploymentJob {
    /// `Some` once the job will report no further progress. A failed status
    /// wins over a full percentage.
    pub fn outcome(&self) -> Option<JobOutcome> {
        match self.status {
            JobStatus::Failed => Some(JobOutcome::Failed),
            JobStatus::Completed => Some(JobOutcome::Succeeded),
            _ if self.percentage >= 100 => Some(JobOutcome::Succeeded),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }
}

/// Clamp a percentage to `0..=100`.
pub fn clamp_percentage(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).floor() as u8
}

fn deserialize_percentage<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let value = Option::<f64>::deserialize(d)?;
    Ok(value.map(clamp_percentage).unwrap_or(0))
}

/// Accepts RFC 3339 and zone-less ISO timestamps (assumed UTC). Anything else
/// is treated as "not started" rather than failing the whole poll.
fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// Elapsed time
// ---------------------------------------------------------------------------

/// Source of wall-clock time, injected so elapsed-time rendering is testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        *self.now.lock() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Time since `started_at`, floored at zero to tolerate clock skew.
pub fn elapsed_since(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    started_at
        .and_then(|start| (now - start).to_std().ok())
        .unwrap_or(Duration::ZERO)
}

/// `mm:ss`; minutes keep counting past 59.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

// ---------------------------------------------------------------------------
// TaskProgress
// ---------------------------------------------------------------------------

/// What a progress view shows for one polled job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskProgress {
    pub job_id: String,
    pub status: JobStatus,
    pub percentage: u8,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    /// Error from the most recent poll, if it failed. Cleared by the next
    /// successful poll.
    pub last_error: Option<String>,
    /// Successful polls applied so far.
    pub updates: u64,
    pub finished: bool,
}

impl TaskProgress {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            percentage: 0,
            message: String::new(),
            started_at: None,
            last_error: None,
            updates: 0,
            finished: false,
        }
    }

    pub fn apply(&mut self, job: &DeploymentJob) {
        self.status = job.status;
        self.percentage = job.percentage.min(100);
        if !job.message.is_empty() {
            self.message = job.message.clone();
        }
        if job.started_at.is_some() {
            self.started_at = job.started_at;
        }
        self.last_error = None;
        self.updates += 1;
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        elapsed_since(self.started_at, now)
    }

    pub fn elapsed_label(&self, now: DateTime<Utc>) -> String {
        format_elapsed(self.elapsed(now))
    }
}
