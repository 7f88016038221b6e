//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → middleware.rs (dispatch rules: rewrite / redirect / pass)
//!     → Router (static files or echo handler)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use middleware::{RewriteLayer, RewriteService, RewrittenFrom};
pub use server::HttpServer;
