//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Rule store / dispatcher produce:
//!     → logging.rs (rule registered, rejected, matched)
//!     → metrics.rs (dispatch outcomes, loaded rule count)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{init_tracing, logger_from_options, RewriteLogger, SilentLogger, TracingLogger};
