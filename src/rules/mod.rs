//! Rewrite rule subsystem.
//!
//! # Data Flow
//! ```text
//! Rule Registration (startup, admin API, config reload):
//!     RawRule
//!     → rule.rs (validate from/to, normalize redirect)
//!     → condition.rs (parse `%{REQUEST_X} pattern`)
//!     → store.rs (append to ordered sequence, atomic swap)
//!
//! Incoming Request (method, url, headers)
//!     → store.rs (load immutable snapshot)
//!     → dispatcher.rs (first rule whose condition AND path match)
//!     → template.rs (method token + first-match replacement)
//!     → Return: Rewrite, Redirect or Pass
//! ```
//!
//! # Design Decisions
//! - Registration order is evaluation order
//! - First match wins, at most one rule applies per request
//! - Condition and path are checked independently, not merged into one regex
//! - Dispatch never fails; a broken condition is simply a non-match

pub mod condition;
pub mod dispatcher;
pub mod rule;
pub mod store;
pub mod template;

pub use condition::{Condition, RequestAttributes, RequestParts};
pub use dispatcher::{dispatch, Outcome};
pub use rule::{RawRule, Rule, RuleError};
pub use store::RuleStore;
