//! Job event broadcaster for real-time lifecycle notifications.
//!
//! The core's responsibility ends at "record updated, event fired";
//! toasts, lists and any other presentation belong to subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::store::JobStatus;

/// What happened to the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobEventKind {
    Created,
    Updated,
    /// Fired exactly once per submission.
    Terminal,
}

/// Lifecycle event for a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvent {
    pub record_id: String,
    pub kind: JobEventKind,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Aggregate progress, batch jobs only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_visits: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_visits: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    pub fn new(
        record_id: &str,
        kind: JobEventKind,
        status: JobStatus,
        message: Option<String>,
    ) -> Self {
        Self {
            record_id: record_id.to_string(),
            kind,
            status,
            message,
            completed_visits: None,
            total_visits: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_progress(mut self, completed: Option<u32>, total: Option<u32>) -> Self {
        self.completed_visits = completed;
        self.total_visits = total;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == JobEventKind::Terminal
    }
}

/// Broadcasts job lifecycle events to all subscribers.
#[derive(Clone)]
pub struct JobEventBroadcaster {
    sender: Arc<broadcast::Sender<JobEvent>>,
}

impl JobEventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: JobEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }

    pub fn created(&self, record_id: &str, status: JobStatus, message: Option<String>) {
        self.send(JobEvent::new(
            record_id,
            JobEventKind::Created,
            status,
            message,
        ));
    }

    pub fn updated(&self, record_id: &str, status: JobStatus, message: Option<String>) {
        self.send(JobEvent::new(
            record_id,
            JobEventKind::Updated,
            status,
            message,
        ));
    }

    pub fn terminal(&self, record_id: &str, status: JobStatus, message: Option<String>) {
        self.send(JobEvent::new(
            record_id,
            JobEventKind::Terminal,
            status,
            message,
        ));
    }
}

impl Default for JobEventBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}
