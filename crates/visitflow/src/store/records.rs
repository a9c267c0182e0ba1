//! Job record types and their partial-update patches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a job record.
///
/// Transitions only move forward: `Idle -> Running -> {Completed, Error}`.
/// Terminal states absorb all further events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Idle,
    Running,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }

    /// Whether a record may move from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            JobStatus::Idle => true,
            JobStatus::Running => matches!(
                next,
                JobStatus::Running | JobStatus::Completed | JobStatus::Error
            ),
            JobStatus::Completed | JobStatus::Error => false,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Idle => write!(f, "idle"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// A record stored in a [`RecordStore`](crate::store::RecordStore).
///
/// Identity is the locally generated `record_id`; an executor-supplied job
/// id is a secondary correlation field set at most once.
pub trait JobRecord {
    type Patch;

    fn record_id(&self) -> &str;
    fn status(&self) -> JobStatus;
    fn executor_job_id(&self) -> Option<&str>;

    /// Structural merge: only supplied fields change, absent fields keep
    /// their prior values. Invalid status transitions are dropped.
    fn apply(&mut self, patch: Self::Patch);
}

// ─── Single visit ───────────────────────────────────────────────────────────

/// One single-visit automation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecord {
    pub record_id: String,
    /// External resource acted upon; validated before submission.
    pub url: String,
    pub status: JobStatus,
    /// Last-known human-readable status detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Creation time, immutable once set.
    pub timestamp: DateTime<Utc>,
    /// Execution mode, immutable once submitted.
    pub headless: bool,
    /// Executor-issued id, set at most once before the first poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_job_id: Option<String>,
}

impl VisitRecord {
    pub fn new(url: &str, headless: bool) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            url: url.to_string(),
            status: JobStatus::Running,
            message: None,
            timestamp: Utc::now(),
            headless,
            executor_job_id: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisitPatch {
    pub status: Option<JobStatus>,
    pub message: Option<String>,
    pub executor_job_id: Option<String>,
}

impl VisitPatch {
    pub fn status(status: JobStatus, message: Option<String>) -> Self {
        Self {
            status: Some(status),
            message,
            executor_job_id: None,
        }
    }
}

impl JobRecord for VisitRecord {
    type Patch = VisitPatch;

    fn record_id(&self) -> &str {
        &self.record_id
    }

    fn status(&self) -> JobStatus {
        self.status
    }

    fn executor_job_id(&self) -> Option<&str> {
        self.executor_job_id.as_deref()
    }

    fn apply(&mut self, patch: VisitPatch) {
        if let Some(status) = patch.status {
            if self.status.can_transition_to(status) {
                self.status = status;
            } else {
                log::warn!(
                    "Dropping status transition {} -> {} for visit record {}",
                    self.status,
                    status,
                    self.record_id
                );
            }
        }
        if patch.message.is_some() {
            self.message = patch.message;
        }
        if self.executor_job_id.is_none() {
            if let Some(id) = patch.executor_job_id {
                self.executor_job_id = Some(id);
            }
        }
    }
}

// ─── Batch ──────────────────────────────────────────────────────────────────

/// One multi-visit automation request tracked as aggregate progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub record_id: String,
    /// Input data source for the batch.
    pub file_path: String,
    pub status: JobStatus,
    pub total_visits: u32,
    pub completed_visits: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub headless: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_job_id: Option<String>,
}

impl BatchRecord {
    pub fn new(file_path: &str, headless: bool) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string(),
            status: JobStatus::Running,
            total_visits: 0,
            completed_visits: 0,
            message: None,
            timestamp: Utc::now(),
            headless,
            executor_job_id: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchPatch {
    pub status: Option<JobStatus>,
    pub message: Option<String>,
    pub total_visits: Option<u32>,
    pub completed_visits: Option<u32>,
    pub executor_job_id: Option<String>,
}

impl JobRecord for BatchRecord {
    type Patch = BatchPatch;

    fn record_id(&self) -> &str {
        &self.record_id
    }

    fn status(&self) -> JobStatus {
        self.status
    }

    fn executor_job_id(&self) -> Option<&str> {
        self.executor_job_id.as_deref()
    }

    fn apply(&mut self, patch: BatchPatch) {
        if let Some(status) = patch.status {
            if self.status.can_transition_to(status) {
                self.status = status;
            } else {
                log::warn!(
                    "Dropping status transition {} -> {} for batch record {}",
                    self.status,
                    status,
                    self.record_id
                );
            }
        }
        if patch.message.is_some() {
            self.message = patch.message;
        }
        // Progress only ever moves forward while the batch is running
        if let Some(total) = patch.total_visits {
            self.total_visits = self.total_visits.max(total);
        }
        if let Some(completed) = patch.completed_visits {
            self.completed_visits = self.completed_visits.max(completed);
        }
        if self.executor_job_id.is_none() {
            if let Some(id) = patch.executor_job_id {
                self.executor_job_id = Some(id);
            }
        }
    }
}
