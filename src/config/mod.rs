//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RewriteConfig (validated, immutable)
//!     → rules handed to the RuleStore
//!
//! On file change (--watch):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → RuleStore::replace swaps the rule sequence atomically
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A failed reload keeps the current rules

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, ListenerConfig, LoggingConfig, ObservabilityConfig, RewriteConfig, ServerConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
