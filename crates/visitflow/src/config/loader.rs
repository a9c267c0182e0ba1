use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator =
        jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
            message: format!("Failed to compile JSON schema: {}", e),
        })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.work_week.week_start_day > 6 || config.work_week.week_end_day > 6 {
        return Err(ConfigError::Validation {
            message: format!(
                "Work week days must be in 0..=6, got start={} end={}",
                config.work_week.week_start_day, config.work_week.week_end_day
            ),
        });
    }

    if config.work_week.cutoff_hour > 23 {
        return Err(ConfigError::Validation {
            message: format!(
                "Cutoff hour must be in 0..=23, got {}",
                config.work_week.cutoff_hour
            ),
        });
    }

    if config.polling.interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "Polling interval must be greater than zero".to_string(),
        });
    }

    if config.submission.site_marker.trim().is_empty()
        || config.submission.visit_path_marker.trim().is_empty()
    {
        return Err(ConfigError::Validation {
            message: "Submission URL markers must not be empty".to_string(),
        });
    }

    Ok(())
}
