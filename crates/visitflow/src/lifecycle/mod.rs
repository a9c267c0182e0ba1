//! Lifecycle managers: one submission in, one terminal notification out.

pub mod batch;
pub mod visit;

pub use batch::BatchLifecycleManager;
pub use visit::VisitLifecycleManager;
