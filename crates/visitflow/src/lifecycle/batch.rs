//! Batch-visit lifecycle orchestration.
//!
//! Same shape as the single-visit manager, but the status payload carries
//! aggregate progress counts that are merged onto one batch record.

use std::sync::{Arc, Mutex};

use log::{error, info, warn};

use crate::broadcast::{JobEvent, JobEventBroadcaster, JobEventKind};
use crate::config::PollingConfig;
use crate::error::Result;
use crate::executor::{AutomationExecutor, BatchStatusReport};
use crate::scheduler::{PollHandle, PollOutcome, PollingScheduler};
use crate::store::{BatchPatch, BatchRecord, JobStatus, RecordStore};
use crate::validation::validate_batch_source;

pub struct BatchLifecycleManager {
    executor: Arc<dyn AutomationExecutor>,
    store: Arc<RecordStore<BatchRecord>>,
    events: JobEventBroadcaster,
    scheduler: PollingScheduler,
    active: Mutex<Option<PollHandle>>,
}

impl BatchLifecycleManager {
    pub fn new(
        executor: Arc<dyn AutomationExecutor>,
        store: Arc<RecordStore<BatchRecord>>,
        events: JobEventBroadcaster,
        polling: &PollingConfig,
    ) -> Self {
        Self {
            executor,
            store,
            events,
            scheduler: PollingScheduler::from_config(polling),
            active: Mutex::new(None),
        }
    }

    /// Submits a batch input file for automated processing.
    ///
    /// An empty source path is rejected before any record exists; executor
    /// failures after that point are absorbed into the record.
    pub async fn submit(&self, file_path: &str, headless: bool) -> Result<String> {
        validate_batch_source(file_path)?;

        let record = BatchRecord::new(file_path, headless);
        let record_id = record.record_id.clone();
        self.store.append(record);
        self.events.created(&record_id, JobStatus::Running, None);
        info!("Batch submission {record_id} created for {file_path}");

        let ack = match self.executor.start_batch(file_path, headless).await {
            Ok(ack) => ack,
            Err(e) => {
                let message = e.to_string();
                error!("Batch submission {record_id} rejected by executor: {message}");
                self.store.update(
                    &record_id,
                    BatchPatch {
                        status: Some(JobStatus::Error),
                        message: Some(message.clone()),
                        ..Default::default()
                    },
                );
                self.events
                    .terminal(&record_id, JobStatus::Error, Some(message));
                return Ok(record_id);
            }
        };

        let executor_job_id = ack
            .job_id
            .unwrap_or_else(|| format!("local-{record_id}"));
        self.store.update(
            &record_id,
            BatchPatch {
                message: ack.message,
                executor_job_id: Some(executor_job_id),
                ..Default::default()
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
                let report = executor.batch_status().await?;
                store.update(
                    &rid,
                    BatchPatch {
                        status: Some(report.status),
                        message: report.message.clone(),
                        total_visits: report.total_visits,
                        completed_visits: report.completed_visits,
                        executor_job_id: None,
                    },
                );
                events.send(
                    JobEvent::new(&rid, JobEventKind::Updated, report.status, report.message.clone())
                        .with_progress(report.completed_visits, report.total_visits),
                );
                Ok(report)
            }
        };

        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let rid = record_id.to_string();
        let on_terminal = move |outcome: PollOutcome<BatchStatusReport>| match outcome {
            PollOutcome::Terminal(report) => {
                info!("Batch {rid} finished with status {}", report.status);
                events.send(
                    JobEvent::new(&rid, JobEventKind::Terminal, report.status, report.message)
                        .with_progress(report.completed_visits, report.total_visits),
                );
            }
            PollOutcome::Failed(e) => {
                let message = e.to_string();
                store.update(
                    &rid,
                    BatchPatch {
                        status: Some(JobStatus::Error),
                        message: Some(message.clone()),
                        ..Default::default()
                    },
                );
                events.terminal(&rid, JobStatus::Error, Some(message));
            }
            PollOutcome::TimedOut => {
                let message =
                    "Polling timed out before the executor reported completion".to_string();
                warn!("Batch {rid}: {message}");
                store.update(
                    &rid,
                    BatchPatch {
                        status: Some(JobStatus::Error),
                        message: Some(message.clone()),
                        ..Default::default()
                    },
                );
                events.terminal(&rid, JobStatus::Error, Some(message));
            }
        };

        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.take() {
            previous.stop();
        }
        *active = Some(self.scheduler.start(check, on_terminal));
    }

    /// Stops the active polling session, if any.
    pub fn cancel(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = active.take() {
            info!("Cancelling active batch polling session");
            handle.stop();
        }
    }

    pub fn store(&self) -> &Arc<RecordStore<BatchRecord>> {
        &self.store
    }
}

impl Drop for BatchLifecycleManager {
    fn drop(&mut self) {
        self.cancel();
    }
}
