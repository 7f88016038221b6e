//! Per-request rule evaluation.
//!
//! # Responsibilities
//! - Scan a rule snapshot in registration order
//! - Check the condition, then the path pattern, of each rule
//! - Build the target URL for the first rule that passes both
//!
//! # Design Decisions
//! - Pure function over an immutable snapshot; no shared state is touched
//! - The outcome is a value, the HTTP layer applies it. Exactly one of
//!   rewrite, redirect or pass is produced per request.

use axum::http::StatusCode;

use crate::observability::RewriteLogger;
use crate::rules::condition::RequestAttributes;
use crate::rules::rule::Rule;
use crate::rules::template;

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Replace the request URL and continue to the next handler.
    Rewrite { url: String },

    /// Answer with a redirect; the next handler is not called.
    Redirect { status: StatusCode, location: String },

    /// No rule applied; continue unchanged.
    Pass,
}

impl Outcome {
    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Outcome::Rewrite { .. } => "rewrite",
            Outcome::Redirect { .. } => "redirect",
            Outcome::Pass => "pass",
        }
    }
}

/// Evaluate `rules` against a request. First match wins.
pub fn dispatch<R>(rules: &[Rule], req: &R, logger: &dyn RewriteLogger) -> Outcome
where
    R: RequestAttributes + ?Sized,
{
    if rules.is_empty() {
        return Outcome::Pass;
    }

    let url = req.request_url();

    for rule in rules {
        if !rule.condition().evaluate(req) {
            continue;
        }
        if !rule.from().is_match(url) {
            continue;
        }

        let to = template::substitute_method(rule.to(), req.request_method());
        let target = template::replace_first(rule.from(), url, &to);
        logger.matched(rule, url, &target);

        return match rule.redirect() {
            Some(status) => Outcome::Redirect {
                status,
                location: target,
            },
            None => Outcome::Rewrite { url: target },
        };
    }

    Outcome::Pass
}
