//! Single-visit lifecycle orchestration.

use std::sync::{Arc, Mutex};

use log::{error, info, warn};

use crate::broadcast::JobEventBroadcaster;
use crate::config::{PollingConfig, SubmissionConfig};
use crate::error::Result;
use crate::executor::AutomationExecutor;
use crate::scheduler::{PollHandle, PollOutcome, PollingScheduler};
use crate::store::{JobStatus, RecordStore, VisitPatch, VisitRecord};
use crate::validation::VisitUrlValidator;

/// Drives one visit submission: validate, create the record, start the
/// executor, observe it through a polling session, and emit exactly one
/// terminal event.
pub struct VisitLifecycleManager {
    executor: Arc<dyn AutomationExecutor>,
    store: Arc<RecordStore<VisitRecord>>,
    events: JobEventBroadcaster,
    scheduler: PollingScheduler,
    url_validator: VisitUrlValidator,
    /// The single-visit lane runs at most one session at a time.
    active: Mutex<Option<PollHandle>>,
}

impl VisitLifecycleManager {
    pub fn new(
        executor: Arc<dyn AutomationExecutor>,
        store: Arc<RecordStore<VisitRecord>>,
        events: JobEventBroadcaster,
        polling: &PollingConfig,
        submission: &SubmissionConfig,
    ) -> Result<Self> {
        Ok(Self {
            executor,
            store,
            events,
            scheduler: PollingScheduler::from_config(polling),
            url_validator: VisitUrlValidator::new(submission)?,
            active: Mutex::new(None),
        })
    }

    /// Submits a visit URL for automated processing.
    ///
    /// A malformed URL is rejected up front with no record created. Once
    /// a record exists, executor failures are absorbed into it: the
    /// record is marked `error`, one terminal event fires, and the record
    /// id is still returned.
    pub async fn submit(
        &self,
        url: &str,
        headless: bool,
        context_id: Option<&str>,
    ) -> Result<String> {
        self.url_validator.validate(url)?;

        let record = VisitRecord::new(url, headless);
        let record_id = record.record_id.clone();
        self.store.append(record);
        self.events.created(&record_id, JobStatus::Running, None);
        info!("Visit submission {record_id} created for {url}");

        let ack = match self.executor.start_visit(url, headless, context_id).await {
            Ok(ack) => ack,
            Err(e) => {
                let message = e.to_string();
                error!("Visit submission {record_id} rejected by executor: {message}");
                self.store.update(
                    &record_id,
                    VisitPatch::status(JobStatus::Error, Some(message.clone())),
                );
                self.events
                    .terminal(&record_id, JobStatus::Error, Some(message));
                return Ok(record_id);
            }
        };

        // Adopt the executor's id or synthesize a local fallback; set
        // exactly once, before the first poll.
        let executor_job_id = ack
            .job_id
            .unwrap_or_else(|| format!("local-{record_id}"));
        self.store.update(
            &record_id,
            VisitPatch {
                status: None,
                message: ack.message,
                executor_job_id: Some(executor_job_id),
            },
        );

        self.start_session(&record_id);
        Ok(record_id)
    }

    fn start_session(&self, record_id: &str) {
        let executor = Arc::clone(&self.executor);
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let rid = record_id.to_string();

        let check = move || {
            let executor = Arc::clone(&executor);
            let store = Arc::clone(&store);
            let events = events.clone();
            let rid = rid.clone();
            async move {
                let report = executor.visit_status().await?;
                store.update(
                    &rid,
                    VisitPatch::status(report.status, report.message.clone()),
                );
                events.updated(&rid, report.status, report.message.clone());
                Ok(report)
            }
        };

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let rid = record_id.to_string();
        let on_terminal = move |outcome: PollOutcome<crate::executor::StatusReport>| {
            match outcome {
                PollOutcome::Terminal(report) => {
                    // The final check already merged the record
                    info!("Visit {rid} finished with status {}", report.status);
                    events.terminal(&rid, report.status, report.message);
                }
                PollOutcome::Failed(e) => {
                    let message = e.to_string();
                    store.update(
                        &rid,
                        VisitPatch::status(JobStatus::Error, Some(message.clone())),
                    );
                    events.terminal(&rid, JobStatus::Error, Some(message));
                }
                PollOutcome::TimedOut => {
                    let message =
                        "Polling timed out before the executor reported completion".to_string();
                    warn!("Visit {rid}: {message}");
                    store.update(
                        &rid,
                        VisitPatch::status(JobStatus::Error, Some(message.clone())),
                    );
                    events.terminal(&rid, JobStatus::Error, Some(message));
                }
            }
        };

        // The previous session must be stopped before a new timer exists
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.take() {
            previous.stop();
        }
        *active = Some(self.scheduler.start(check, on_terminal));
    }

    /// Stops the active polling session, if any. The session will not
    /// deliver a terminal notification after this returns.
    pub fn cancel(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = active.take() {
            info!("Cancelling active visit polling session");
            handle.stop();
        }
    }

    pub fn store(&self) -> &Arc<RecordStore<VisitRecord>> {
        &self.store
    }
}

impl Drop for VisitLifecycleManager {
    fn drop(&mut self) {
        self.cancel();
    }
}
