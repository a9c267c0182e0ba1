//! Interval-based polling scheduler.
//!
//! Repeatedly invokes a caller-supplied status check at a fixed cadence
//! until the check reports a non-running status, fails, times out, or the
//! session is cancelled through its handle. There is deliberately no
//! retry or backoff: a failed check ends the session and is reported
//! upward, because silently re-polling a broken channel could mask a dead
//! automation run indefinitely.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::Instrument;

use crate::config::PollingConfig;
use crate::error::ExecutorError;

/// Implemented by status payloads so single and batch sessions share one
/// scheduler.
pub trait PollStatus {
    fn is_running(&self) -> bool;
}

impl PollStatus for crate::executor::StatusReport {
    fn is_running(&self) -> bool {
        self.status.is_running()
    }
}

impl PollStatus for crate::executor::BatchStatusReport {
    fn is_running(&self) -> bool {
        self.status.is_running()
    }
}

/// How a polling session ended.
#[derive(Debug)]
pub enum PollOutcome<T> {
    /// The executor reported a non-running status.
    Terminal(T),
    /// A status check failed; fatal for the session.
    Failed(ExecutorError),
    /// The wall-clock ceiling elapsed before a terminal status arrived.
    TimedOut,
}

/// Cancellation handle for one polling session.
///
/// Dropping the handle cancels the session as well; a cancelled session
/// never delivers a terminal notification.
pub struct PollHandle {
    cancel: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl PollHandle {
    /// Stops the session. Idempotent and safe after natural termination.
    pub fn stop(&self) {
        let _ = self.cancel.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the session task to wind down. Test and teardown helper.
    pub async fn wait(self) {
        let _ = self.task.await;
    }
}

pub struct PollingScheduler {
    interval: Duration,
    max_poll_duration: Option<Duration>,
}

impl PollingScheduler {
    pub fn new(interval: Duration, max_poll_duration: Option<Duration>) -> Self {
        Self {
            interval,
            max_poll_duration,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            config.max_poll_secs.map(Duration::from_secs),
        )
    }

    /// Starts a polling session.
    ///
    /// `check` runs once per tick, strictly sequentially: the next tick is
    /// not scheduled before the previous check has resolved. When `check`
    /// yields a non-running status or fails, the session stops itself and
    /// `on_terminal` fires exactly once.
    pub fn start<T, C, Fut, F>(&self, mut check: C, on_terminal: F) -> PollHandle
    where
        T: PollStatus + Send + 'static,
        C: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, ExecutorError>> + Send + 'static,
        F: FnOnce(PollOutcome<T>) + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let interval = self.interval;
        let deadline = self.max_poll_duration.map(|d| Instant::now() + d);

        let session = async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // skip immediate first tick

            let outcome = loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = cancel_rx.changed() => {
                        log::debug!("Polling session cancelled");
                        return;
                    }
                }

                if let Some(deadline) = deadline {
                    if Instant::now() >= deadline {
                        log::warn!("Polling session exceeded its wall-clock ceiling");
                        break PollOutcome::TimedOut;
                    }
                }

                match check().await {
                    Ok(report) if report.is_running() => continue,
                    Ok(report) => break PollOutcome::Terminal(report),
                    Err(e) => {
                        log::error!("Status check failed, ending polling session: {}", e);
                        break PollOutcome::Failed(e);
                    }
                }
            };

            // A session stopped while the final check was in flight must
            // not deliver a late terminal notification.
            if *cancel_rx.borrow() || cancel_rx.has_changed().is_err() {
                return;
            }
            on_terminal(outcome);
        };

        let task = tokio::spawn(session.instrument(tracing::info_span!("poll_session")));

        PollHandle {
            cancel: cancel_tx,
            task,
        }
    }
}
