//! Abstract contract of the external browser-automation executor.
//!
//! The executor runs the actual form-filling work; this crate only starts
//! tasks and observes them through status polls.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ExecutorError;
use crate::store::JobStatus;

/// Immediate response to a start request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartAck {
    /// Executor-issued job id; a local fallback is synthesized when absent.
    pub job_id: Option<String>,
    pub message: Option<String>,
}

/// Status payload for a single-visit job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: JobStatus,
    pub message: Option<String>,
}

/// Status payload for a batch job, with aggregate progress counts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusReport {
    pub status: JobStatus,
    pub message: Option<String>,
    pub total_visits: Option<u32>,
    pub completed_visits: Option<u32>,
}

#[async_trait]
pub trait AutomationExecutor: Send + Sync {
    /// Starts a single-visit job. May fail with a transport or validation
    /// error before any job exists on the executor side.
    async fn start_visit(
        &self,
        url: &str,
        headless: bool,
        context_id: Option<&str>,
    ) -> Result<StartAck, ExecutorError>;

    /// Queries the most recently started single-visit job.
    async fn visit_status(&self) -> Result<StatusReport, ExecutorError>;

    /// Starts a batch job over the visits in `file_path`.
    async fn start_batch(&self, file_path: &str, headless: bool)
        -> Result<StartAck, ExecutorError>;

    /// Queries the most recently started batch job.
    async fn batch_status(&self) -> Result<BatchStatusReport, ExecutorError>;
}
