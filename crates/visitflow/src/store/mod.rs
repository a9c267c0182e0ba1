//! In-memory job record store.
//!
//! Insertion-ordered, append-only collection with key-scoped partial
//! updates. No persistence: job history across restarts is an explicit
//! non-goal of this core.

pub mod records;

use std::sync::RwLock;

pub use records::{BatchPatch, BatchRecord, JobRecord, JobStatus, VisitPatch, VisitRecord};

/// Ordered collection of job records keyed by their local record id.
pub struct RecordStore<T> {
    inner: RwLock<Vec<T>>,
}

impl<T: JobRecord + Clone> RecordStore<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Appends a record. Records are never created implicitly by updates.
    pub fn append(&self, record: T) {
        let mut records = self.inner.write().unwrap_or_else(|e| e.into_inner());
        records.push(record);
    }

    /// Merges `patch` into the record with the given id.
    ///
    /// Returns `false` without touching anything when the id is unknown or
    /// the record has reached a terminal status (frozen).
    pub fn update(&self, record_id: &str, patch: T::Patch) -> bool {
        let mut records = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let Some(record) = records.iter_mut().find(|r| r.record_id() == record_id) else {
            log::warn!("Update for unknown record id {record_id} ignored");
            return false;
        };
        if record.status().is_terminal() {
            log::debug!("Record {record_id} is frozen, update ignored");
            return false;
        }
        record.apply(patch);
        true
    }

    pub fn get(&self, record_id: &str) -> Option<T> {
        let records = self.inner.read().unwrap_or_else(|e| e.into_inner());
        records.iter().find(|r| r.record_id() == record_id).cloned()
    }

    /// Looks a record up by the executor-issued correlation id.
    pub fn find_by_executor_id(&self, executor_job_id: &str) -> Option<T> {
        let records = self.inner.read().unwrap_or_else(|e| e.into_inner());
        records
            .iter()
            .find(|r| r.executor_job_id() == Some(executor_job_id))
            .cloned()
    }

    /// Returns all records, newest first.
    pub fn latest(&self) -> Vec<T> {
        let records = self.inner.read().unwrap_or_else(|e| e.into_inner());
        records.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: JobRecord + Clone> Default for RecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}
