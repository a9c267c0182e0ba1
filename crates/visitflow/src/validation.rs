//! Submission input validation.
//!
//! Rejection happens here, before any record or executor call exists.

use regex::Regex;

use crate::config::SubmissionConfig;
use crate::error::{ConfigError, ValidationError};

/// Checks that a submission URL targets the configured portal and names a
/// visit. The pattern is compiled once per manager at construction.
pub struct VisitUrlValidator {
    pattern: Regex,
    site_marker: String,
    visit_path_marker: String,
}

impl VisitUrlValidator {
    pub fn new(config: &SubmissionConfig) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&format!(
            r"^https?://\S*{}\S*{}",
            regex::escape(&config.site_marker),
            regex::escape(&config.visit_path_marker)
        ))
        .map_err(|e| ConfigError::Validation {
            message: format!("Invalid submission marker pattern: {}", e),
        })?;

        Ok(Self {
            pattern,
            site_marker: config.site_marker.clone(),
            visit_path_marker: config.visit_path_marker.clone(),
        })
    }

    pub fn validate(&self, url: &str) -> Result<(), ValidationError> {
        if self.pattern.is_match(url) {
            Ok(())
        } else {
            Err(ValidationError::InvalidVisitUrl {
                url: url.to_string(),
                reason: format!(
                    "expected an http(s) URL containing '{}' and '{}'",
                    self.site_marker, self.visit_path_marker
                ),
            })
        }
    }
}

pub fn validate_batch_source(file_path: &str) -> Result<(), ValidationError> {
    if file_path.trim().is_empty() {
        return Err(ValidationError::EmptyBatchSource);
    }
    Ok(())
}
