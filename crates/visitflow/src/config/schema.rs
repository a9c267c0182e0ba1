use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub work_week: WorkWeekConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
}

/// Boundaries of the work week, JS `getDay` numbering (0 = Sunday).
///
/// `week_end_day` may be numerically below `week_start_day`; that denotes
/// a week wrapping past the natural week boundary (e.g. Friday through
/// Monday).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkWeekConfig {
    #[serde(default = "default_week_start_day")]
    pub week_start_day: u8,
    #[serde(default = "default_week_end_day")]
    pub week_end_day: u8,
    #[serde(default = "default_cutoff_hour")]
    pub cutoff_hour: u8,
}

fn default_week_start_day() -> u8 {
    1
}

fn default_week_end_day() -> u8 {
    5
}

fn default_cutoff_hour() -> u8 {
    17
}

impl Default for WorkWeekConfig {
    fn default() -> Self {
        Self {
            week_start_day: default_week_start_day(),
            week_end_day: default_week_end_day(),
            cutoff_hour: default_cutoff_hour(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Wall-clock ceiling for a polling session. `None` polls until the
    /// executor reports a terminal status.
    #[serde(default)]
    pub max_poll_secs: Option<u64>,
}

fn default_interval_ms() -> u64 {
    2000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_poll_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    #[serde(default = "default_site_marker")]
    pub site_marker: String,
    #[serde(default = "default_visit_path_marker")]
    pub visit_path_marker: String,
    #[serde(default = "default_credential_domain_marker")]
    pub credential_domain_marker: String,
    #[serde(default = "default_min_secret_length")]
    pub min_secret_length: usize,
}

fn default_site_marker() -> String {
    "providerportal".to_string()
}

fn default_visit_path_marker() -> String {
    "/visits/".to_string()
}

fn default_credential_domain_marker() -> String {
    "@".to_string()
}

fn default_min_secret_length() -> usize {
    8
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            site_marker: default_site_marker(),
            visit_path_marker: default_visit_path_marker(),
            credential_domain_marker: default_credential_domain_marker(),
            min_secret_length: default_min_secret_length(),
        }
    }
}
