//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binaries
//! - Provide the injectable rule logger used by the store and dispatcher
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Rule logging is a strategy passed in at construction, so embedders
//!   can silence it without touching the global subscriber
//! - Log level configurable via config and `RUST_LOG`

use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::rules::{Rule, RuleError};

/// Initialize tracing with the given default level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Sink for rule lifecycle events.
pub trait RewriteLogger: Send + Sync {
    /// A rule was accepted into the store.
    fn registered(&self, rule: &Rule);

    /// A rule was refused.
    fn rejected(&self, error: &RuleError);

    /// A rule fired for a request.
    fn matched(&self, rule: &Rule, from: &str, to: &str);
}

/// Logs through `tracing`. Matches are only reported in verbose mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger {
    verbose: bool,
}

impl TracingLogger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl RewriteLogger for TracingLogger {
    fn registered(&self, rule: &Rule) {
        tracing::info!(rule = %rule, "Rewrite rule created");
    }

    fn rejected(&self, error: &RuleError) {
        tracing::error!(error = %error, "Wrong rule given");
    }

    fn matched(&self, rule: &Rule, from: &str, to: &str) {
        if !self.verbose {
            return;
        }
        let action = match rule.redirect() {
            Some(status) => format!("REDIRECT {}", status.as_u16()),
            None => "REWRITE".to_string(),
        };
        tracing::info!(
            condition = %rule.condition(),
            rule = %rule,
            from,
            to,
            "{} matched",
            action
        );
    }
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentLogger;

impl RewriteLogger for SilentLogger {
    fn registered(&self, _rule: &Rule) {}
    fn rejected(&self, _error: &RuleError) {}
    fn matched(&self, _rule: &Rule, _from: &str, _to: &str) {}
}

/// Pick a logger from the `silent` / `verbose` options.
pub fn logger_from_options(silent: bool, verbose: bool) -> Arc<dyn RewriteLogger> {
    if silent {
        Arc::new(SilentLogger)
    } else {
        Arc::new(TracingLogger::new(verbose))
    }
}
