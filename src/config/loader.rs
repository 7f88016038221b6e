//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RewriteConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RewriteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RewriteConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[logging]
silent = true

[[rules]]
from = "^/old$"
to = "/new"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.logging.silent);
        assert_eq!(config.rules.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/rewrite.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[listener\nbind_address = ").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[listener]
bind_address = "nowhere"

[server]
request_timeout_secs = 0
"#
        )
        .unwrap();

        let err = load_config(file.path()).unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Validation failed: "));
    }
}
