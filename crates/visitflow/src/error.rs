use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisitflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Work week error: {0}")]
    WorkWeek(#[from] WorkWeekError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Input rejected before any record or executor call exists.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid visit URL '{url}': {reason}")]
    InvalidVisitUrl { url: String, reason: String },

    #[error("Batch source path must not be empty")]
    EmptyBatchSource,

    #[error("Credential identifier must contain '{marker}'")]
    InvalidIdentifier { marker: String },

    #[error("Credential secret must be at least {min} characters")]
    SecretTooShort { min: usize },
}

/// Failures observed at the executor boundary.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Executor unreachable: {0}")]
    Transport(String),

    #[error("Executor rejected the request: {0}")]
    Rejected(String),

    #[error("Executor returned a malformed status payload: {0}")]
    MalformedStatus(String),
}

#[derive(Error, Debug)]
pub enum WorkWeekError {
    #[error("Weekday out of range: {0} (expected 0..=6)")]
    DayOutOfRange(u8),

    #[error("Cutoff hour out of range: {0} (expected 0..=23)")]
    CutoffOutOfRange(u8),
}

pub type Result<T> = std::result::Result<T, VisitflowError>;
