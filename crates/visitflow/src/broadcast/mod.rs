//! Broadcast channels for streaming lifecycle events to an embedding layer.

pub mod job_events;

pub use job_events::{JobEvent, JobEventBroadcaster, JobEventKind};
