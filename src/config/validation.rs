//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Rules are not checked here: a bad rule is skipped by the store,
//!   it never blocks startup
//! - Validation is pure function: RewriteConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::RewriteConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &RewriteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
