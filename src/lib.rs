//! URL rewrite and redirect middleware.
//!
//! An ordered list of rules is checked against every request. The first
//! rule whose condition and path pattern both match either rewrites the
//! request URL in place or answers with a redirect.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rules;

pub use config::RewriteConfig;
pub use http::{HttpServer, RewriteLayer};
pub use lifecycle::Shutdown;
pub use rules::{dispatch, Outcome, RawRule, Rule, RuleStore};
