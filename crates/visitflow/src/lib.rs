pub mod broadcast;
pub mod config;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod scheduler;
pub mod store;
pub mod validation;
pub mod workweek;

pub use broadcast::{JobEvent, JobEventBroadcaster, JobEventKind};
pub use config::{
    load_config, load_config_from_str, Config, PollingConfig, SubmissionConfig, WorkWeekConfig,
};
pub use credentials::{validate_credentials, CredentialGateway, CredentialOutcome};
pub use error::{
    ConfigError, ExecutorError, Result, ValidationError, VisitflowError, WorkWeekError,
};
pub use executor::{AutomationExecutor, BatchStatusReport, StartAck, StatusReport};
pub use lifecycle::{BatchLifecycleManager, VisitLifecycleManager};
pub use scheduler::{PollHandle, PollOutcome, PollingScheduler};
pub use store::{BatchRecord, JobStatus, RecordStore, VisitRecord};
pub use workweek::{compute_window, WorkWeekWindow};
