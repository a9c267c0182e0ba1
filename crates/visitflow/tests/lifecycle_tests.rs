//! End-to-end lifecycle tests against a scripted mock executor.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use visitflow::{
    AutomationExecutor, BatchLifecycleManager, BatchRecord, BatchStatusReport, ExecutorError,
    JobEvent, JobEventBroadcaster, JobEventKind, JobStatus, PollingConfig, RecordStore, StartAck,
    StatusReport, SubmissionConfig, VisitLifecycleManager, VisitRecord, VisitflowError,
};

const VISIT_URL: &str = "https://providerportal.example.com/app/visits/12345";

fn running(message: &str) -> Result<StatusReport, ExecutorError> {
    Ok(StatusReport {
        status: JobStatus::Running,
        message: Some(message.to_string()),
    })
}

fn completed(message: &str) -> Result<StatusReport, ExecutorError> {
    Ok(StatusReport {
        status: JobStatus::Completed,
        message: Some(message.to_string()),
    })
}

fn batch_running(completed: u32, total: u32) -> Result<BatchStatusReport, ExecutorError> {
    Ok(BatchStatusReport {
        status: JobStatus::Running,
        message: None,
        total_visits: Some(total),
        completed_visits: Some(completed),
    })
}

fn batch_completed(total: u32) -> Result<BatchStatusReport, ExecutorError> {
    Ok(BatchStatusReport {
        status: JobStatus::Completed,
        message: Some("Batch finished".to_string()),
        total_visits: Some(total),
        completed_visits: Some(total),
    })
}

#[derive(Default)]
struct MockExecutor {
    start_acks: Mutex<VecDeque<Result<StartAck, ExecutorError>>>,
    visit_statuses: Mutex<VecDeque<Result<StatusReport, ExecutorError>>>,
    batch_statuses: Mutex<VecDeque<Result<BatchStatusReport, ExecutorError>>>,
    status_calls: AtomicUsize,
}

impl MockExecutor {
    fn with_visit_script(statuses: Vec<Result<StatusReport, ExecutorError>>) -> Arc<Self> {
        let executor = Self::default();
        *executor.visit_statuses.lock().unwrap() = VecDeque::from(statuses);
        Arc::new(executor)
    }

    fn with_batch_script(statuses: Vec<Result<BatchStatusReport, ExecutorError>>) -> Arc<Self> {
        let executor = Self::default();
        *executor.batch_statuses.lock().unwrap() = VecDeque::from(statuses);
        Arc::new(executor)
    }

    fn reject_start(&self, message: &str) {
        self.start_acks
            .lock()
            .unwrap()
            .push_back(Err(ExecutorError::Rejected(message.to_string())));
    }

    fn ack_without_job_id(&self) {
        self.start_acks.lock().unwrap().push_back(Ok(StartAck {
            job_id: None,
            message: None,
        }));
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AutomationExecutor for MockExecutor {
    async fn start_visit(
        &self,
        _url: &str,
        _headless: bool,
        _context_id: Option<&str>,
    ) -> Result<StartAck, ExecutorError> {
        self.start_acks.lock().unwrap().pop_front().unwrap_or(Ok(StartAck {
            job_id: Some("exec-job-1".to_string()),
            message: Some("Accepted".to_string()),
        }))
    }

    async fn visit_status(&self) -> Result<StatusReport, ExecutorError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.visit_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExecutorError::Transport("script exhausted".to_string())))
    }

    async fn start_batch(
        &self,
        _file_path: &str,
        _headless: bool,
    ) -> Result<StartAck, ExecutorError> {
        self.start_acks.lock().unwrap().pop_front().unwrap_or(Ok(StartAck {
            job_id: Some("exec-batch-1".to_string()),
            message: None,
        }))
    }

    async fn batch_status(&self) -> Result<BatchStatusReport, ExecutorError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.batch_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExecutorError::Transport("script exhausted".to_string())))
    }
}

fn fast_polling() -> PollingConfig {
    PollingConfig {
        interval_ms: 10,
        max_poll_secs: None,
    }
}

fn visit_manager(
    executor: Arc<MockExecutor>,
    polling: PollingConfig,
) -> (
    VisitLifecycleManager,
    Arc<RecordStore<VisitRecord>>,
    broadcast::Receiver<JobEvent>,
) {
    let store = Arc::new(RecordStore::new());
    let events = JobEventBroadcaster::new(64);
    let rx = events.subscribe();
    let manager = VisitLifecycleManager::new(
        executor,
        Arc::clone(&store),
        events,
        &polling,
        &SubmissionConfig::default(),
    )
    .unwrap();
    (manager, store, rx)
}

fn batch_manager(
    executor: Arc<MockExecutor>,
    polling: PollingConfig,
) -> (
    BatchLifecycleManager,
    Arc<RecordStore<BatchRecord>>,
    broadcast::Receiver<JobEvent>,
) {
    let store = Arc::new(RecordStore::new());
    let events = JobEventBroadcaster::new(64);
    let rx = events.subscribe();
    let manager = BatchLifecycleManager::new(executor, Arc::clone(&store), events, &polling);
    (manager, store, rx)
}

/// Receives events until the first terminal one, with a generous timeout.
async fn collect_until_terminal(rx: &mut broadcast::Receiver<JobEvent>) -> Vec<JobEvent> {
    let mut events = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for terminal event")
            .expect("event channel closed");
        let terminal = event.is_terminal();
        events.push(event);
        if terminal {
            return events;
        }
    }
}

/// Asserts no further terminal event shows up in a short follow-up window.
async fn assert_no_more_terminals(rx: &mut broadcast::Receiver<JobEvent>) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    while let Ok(event) = rx.try_recv() {
        assert!(!event.is_terminal(), "second terminal event observed");
    }
}

#[tokio::test]
async fn visit_runs_to_completion() {
    let executor = MockExecutor::with_visit_script(vec![
        running("Filling form"),
        running("Submitting"),
        completed("Visit saved"),
    ]);
    let (manager, store, mut rx) = visit_manager(Arc::clone(&executor), fast_polling());

    let record_id = manager.submit(VISIT_URL, true, Some("ctx-1")).await.unwrap();

    let events = collect_until_terminal(&mut rx).await;
    assert_eq!(events[0].kind, JobEventKind::Created);
    let terminal = events.last().unwrap();
    assert_eq!(terminal.record_id, record_id);
    assert_eq!(terminal.status, JobStatus::Completed);
    assert_no_more_terminals(&mut rx).await;

    let record = store.get(&record_id).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.message.as_deref(), Some("Visit saved"));
    assert_eq!(record.executor_job_id.as_deref(), Some("exec-job-1"));
    assert_eq!(executor.status_calls(), 3);
}

#[tokio::test]
async fn malformed_url_is_rejected_before_any_record() {
    let executor = MockExecutor::with_visit_script(vec![completed("never polled")]);
    let (manager, store, mut rx) = visit_manager(Arc::clone(&executor), fast_polling());

    let result = manager
        .submit("https://providerportal.example.com/app/dashboard", true, None)
        .await;

    assert!(matches!(result, Err(VisitflowError::Validation(_))));
    assert!(store.is_empty());
    assert!(rx.try_recv().is_err());
    assert_eq!(executor.status_calls(), 0);
}

#[tokio::test]
async fn executor_rejection_marks_record_error_without_polling() {
    let executor = MockExecutor::with_visit_script(vec![running("never reached")]);
    executor.reject_start("portal session expired");
    let (manager, store, mut rx) = visit_manager(Arc::clone(&executor), fast_polling());

    let record_id = manager.submit(VISIT_URL, false, None).await.unwrap();

    let events = collect_until_terminal(&mut rx).await;
    let terminal = events.last().unwrap();
    assert_eq!(terminal.status, JobStatus::Error);

    let record = store.get(&record_id).unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record
        .message
        .as_deref()
        .unwrap()
        .contains("portal session expired"));
    // No polling session ever started
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(executor.status_calls(), 0);
}

#[tokio::test]
async fn polling_failure_on_third_tick_is_terminal() {
    let executor = MockExecutor::with_visit_script(vec![
        running("tick 1"),
        running("tick 2"),
        Err(ExecutorError::Transport("connection reset".to_string())),
    ]);
    let (manager, store, mut rx) = visit_manager(Arc::clone(&executor), fast_polling());

    let record_id = manager.submit(VISIT_URL, true, None).await.unwrap();

    let events = collect_until_terminal(&mut rx).await;
    let terminal = events.last().unwrap();
    assert_eq!(terminal.status, JobStatus::Error);
    assert_no_more_terminals(&mut rx).await;

    let record = store.get(&record_id).unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record.message.as_deref().unwrap().contains("connection reset"));
    // Polling stopped right after the failing tick
    assert_eq!(executor.status_calls(), 3);
}

#[tokio::test]
async fn missing_executor_job_id_gets_local_fallback() {
    let executor = MockExecutor::with_visit_script(vec![completed("done")]);
    executor.ack_without_job_id();
    let (manager, store, mut rx) = visit_manager(executor, fast_polling());

    let record_id = manager.submit(VISIT_URL, true, None).await.unwrap();
    collect_until_terminal(&mut rx).await;

    let record = store.get(&record_id).unwrap();
    assert_eq!(
        record.executor_job_id.as_deref(),
        Some(format!("local-{record_id}").as_str())
    );
}

#[tokio::test]
async fn cancel_stops_polling_without_terminal_notification() {
    let executor =
        MockExecutor::with_visit_script((0..1024).map(|_| running("tick")).collect());
    let (manager, store, mut rx) = visit_manager(Arc::clone(&executor), fast_polling());

    let record_id = manager.submit(VISIT_URL, true, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.cancel();

    let calls_at_cancel = executor.status_calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    // At most one in-flight check resolves after cancellation
    assert!(executor.status_calls() <= calls_at_cancel + 1);

    while let Ok(event) = rx.try_recv() {
        assert!(!event.is_terminal(), "cancelled session delivered a terminal event");
    }
    assert_eq!(store.get(&record_id).unwrap().status, JobStatus::Running);
}

#[tokio::test]
async fn resubmission_stops_the_previous_session() {
    let mut script: Vec<_> = (0..5).map(|_| running("first job tick")).collect();
    script.push(completed("second job done"));
    let executor = MockExecutor::with_visit_script(script);
    let (manager, _store, mut rx) = visit_manager(Arc::clone(&executor), fast_polling());

    let _first = manager.submit(VISIT_URL, true, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    let second = manager.submit(VISIT_URL, true, None).await.unwrap();

    let events = collect_until_terminal(&mut rx).await;
    let terminal = events.last().unwrap();
    // Only the second session is still alive to report
    assert_eq!(terminal.record_id, second);
    assert_no_more_terminals(&mut rx).await;
}

#[tokio::test]
async fn poll_timeout_marks_record_error() {
    let executor =
        MockExecutor::with_visit_script((0..4096).map(|_| running("stuck")).collect());
    let polling = PollingConfig {
        interval_ms: 10,
        max_poll_secs: Some(1),
    };
    let (manager, store, mut rx) = visit_manager(executor, polling);

    let record_id = manager.submit(VISIT_URL, true, None).await.unwrap();
    let events = collect_until_terminal(&mut rx).await;
    let terminal = events.last().unwrap();
    assert_eq!(terminal.status, JobStatus::Error);

    let record = store.get(&record_id).unwrap();
    assert_eq!(record.status, JobStatus::Error);
    assert!(record.message.as_deref().unwrap().contains("timed out"));
}

#[tokio::test]
async fn batch_runs_to_completion_with_monotonic_progress() {
    let executor = MockExecutor::with_batch_script(vec![
        batch_running(3, 10),
        batch_running(5, 10),
        // A regressed report from the executor must not move the record back
        batch_running(4, 10),
        batch_completed(10),
    ]);
    let (manager, store, mut rx) = batch_manager(Arc::clone(&executor), fast_polling());

    let record_id = manager.submit("/data/visits.xlsx", true).await.unwrap();

    let events = collect_until_terminal(&mut rx).await;
    let terminal = events.last().unwrap();
    assert_eq!(terminal.status, JobStatus::Completed);
    assert_eq!(terminal.completed_visits, Some(10));
    assert_eq!(terminal.total_visits, Some(10));
    assert_no_more_terminals(&mut rx).await;

    // The record clamped the regressed tick and finished at full progress
    let record = store.get(&record_id).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert_eq!(record.total_visits, 10);
    assert_eq!(record.completed_visits, 10);
    assert_eq!(executor.status_calls(), 4);
}

#[tokio::test]
async fn empty_batch_source_is_rejected_before_any_record() {
    let executor = MockExecutor::with_batch_script(vec![batch_completed(1)]);
    let (manager, store, mut rx) = batch_manager(Arc::clone(&executor), fast_polling());

    let result = manager.submit("  ", true).await;

    assert!(matches!(result, Err(VisitflowError::Validation(_))));
    assert!(store.is_empty());
    assert!(rx.try_recv().is_err());
    assert_eq!(executor.status_calls(), 0);
}

#[tokio::test]
async fn batch_polling_failure_freezes_record() {
    let executor = MockExecutor::with_batch_script(vec![
        batch_running(2, 6),
        Err(ExecutorError::Transport("executor gone".to_string())),
    ]);
    let (manager, store, mut rx) = batch_manager(executor, fast_polling());

    let record_id = manager.submit("/data/visits.xlsx", false).await.unwrap();
    let events = collect_until_terminal(&mut rx).await;
    assert_eq!(events.last().unwrap().status, JobStatus::Error);

    let record = store.get(&record_id).unwrap();
    assert_eq!(record.status, JobStatus::Error);
    // Progress observed before the failure is retained
    assert_eq!(record.completed_visits, 2);
    assert_eq!(record.total_visits, 6);
}

#[tokio::test]
async fn visits_and_batches_poll_concurrently_without_interference() {
    let executor = Arc::new(MockExecutor::default());
    *executor.visit_statuses.lock().unwrap() =
        VecDeque::from(vec![running("visit tick"), completed("visit done")]);
    *executor.batch_statuses.lock().unwrap() = VecDeque::from(vec![
        batch_running(1, 2),
        batch_running(2, 2),
        batch_completed(2),
    ]);

    let (visits, visit_store, mut visit_rx) =
        visit_manager(Arc::clone(&executor), fast_polling());
    let (batches, batch_store, mut batch_rx) =
        batch_manager(Arc::clone(&executor), fast_polling());

    let visit_id = visits.submit(VISIT_URL, true, None).await.unwrap();
    let batch_id = batches.submit("/data/visits.xlsx", true).await.unwrap();

    let visit_events = collect_until_terminal(&mut visit_rx).await;
    let batch_events = collect_until_terminal(&mut batch_rx).await;

    assert_eq!(visit_events.last().unwrap().record_id, visit_id);
    assert_eq!(batch_events.last().unwrap().record_id, batch_id);
    assert_eq!(visit_store.get(&visit_id).unwrap().status, JobStatus::Completed);
    assert_eq!(batch_store.get(&batch_id).unwrap().status, JobStatus::Completed);
}
