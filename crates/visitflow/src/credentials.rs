//! Credential collaborator boundary.
//!
//! Verification itself happens elsewhere; this module only holds the
//! caller-side validation rules and the gateway trait shape. Secrets are
//! wrapped in [`SecretString`] so they never end up in logs or serialized
//! payloads.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::SubmissionConfig;
use crate::error::{ExecutorError, ValidationError};

#[derive(Debug, Clone)]
pub struct CredentialOutcome {
    pub success: bool,
    pub message: Option<String>,
}

#[async_trait]
pub trait CredentialGateway: Send + Sync {
    async fn submit_credentials(
        &self,
        identifier: &str,
        secret: &SecretString,
    ) -> Result<CredentialOutcome, ExecutorError>;
}

/// Validates credentials before the gateway is ever invoked.
pub fn validate_credentials(
    config: &SubmissionConfig,
    identifier: &str,
    secret: &SecretString,
) -> Result<(), ValidationError> {
    if !identifier.contains(&config.credential_domain_marker) {
        return Err(ValidationError::InvalidIdentifier {
            marker: config.credential_domain_marker.clone(),
        });
    }
    if secret.expose_secret().len() < config.min_secret_length {
        return Err(ValidationError::SecretTooShort {
            min: config.min_secret_length,
        });
    }
    Ok(())
}
