//! Rule definitions: raw input and compiled form.
//!
//! # Responsibilities
//! - Accept loosely typed rule input (config file, admin API)
//! - Validate `from`/`to` and compile the source pattern
//! - Normalize the redirect field into an optional status code
//!
//! # Design Decisions
//! - Raw fields are `serde_json::Value` so a wrongly typed field rejects
//!   the single rule instead of failing the whole config parse
//! - Compiled rules are immutable; the store only ever appends or swaps

use std::fmt;

use axum::http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::rules::condition::Condition;

/// Reasons a rule is refused at registration.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule has no `from` pattern (expected a non-empty string)")]
    MissingFrom,

    #[error("rule has no `to` target (expected a non-empty string)")]
    MissingTo,

    #[error("invalid `from` pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Rule as it arrives from configuration, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawRule {
    /// Optional `%{REQUEST_<ATTR>} <PATTERN>` gate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,

    /// Regex source tested against the request URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Value>,

    /// Replacement template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Value>,

    /// Redirect status, or a truthy flag meaning 302.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Value>,
}

impl RawRule {
    /// Create a rewrite rule from a pattern and a target.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(Value::String(from.into())),
            to: Some(Value::String(to.into())),
            ..Self::default()
        }
    }

    pub fn with_redirect(mut self, redirect: impl Into<Value>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(Value::String(condition.into()));
        self
    }
}

/// A validated, compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct Rule {
    condition: Condition,
    from: Regex,
    to: String,
    redirect: Option<StatusCode>,
}

impl Rule {
    /// Validate and compile a raw rule.
    pub fn compile(raw: &RawRule) -> Result<Self, RuleError> {
        let from = non_empty_str(raw.from.as_ref()).ok_or(RuleError::MissingFrom)?;
        let to = non_empty_str(raw.to.as_ref()).ok_or(RuleError::MissingTo)?;

        let pattern = Regex::new(from).map_err(|source| RuleError::InvalidPattern {
            pattern: from.to_string(),
            source,
        })?;

        let condition = match raw.condition.as_ref() {
            Some(Value::String(text)) if !text.is_empty() => Condition::parse(text),
            Some(other) if is_truthy(other) => Condition::Malformed(other.to_string()),
            _ => Condition::Always,
        };

        Ok(Self {
            condition,
            from: pattern,
            to: to.to_string(),
            redirect: redirect_status(raw.redirect.as_ref()),
        })
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Compiled source pattern.
    pub fn from(&self) -> &Regex {
        &self.from
    }

    /// Replacement template, before method substitution.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// `None` means rewrite in place.
    pub fn redirect(&self) -> Option<StatusCode> {
        self.redirect
    }

    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.redirect {
            Some(status) => write!(f, "[REDIRECT {}: ", status.as_u16())?,
            None => write!(f, "[REWRITE: ")?,
        }
        write!(f, "{} -> {}]", self.from.as_str(), self.to)
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// JavaScript-style truthiness, which is what rule files written for
/// connect-style servers assume.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `301.0` counts as `301`; fractional and negative values do not.
fn whole_number(f: f64) -> Option<u64> {
    (f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

fn redirect_status(value: Option<&Value>) -> Option<StatusCode> {
    let value = value.filter(|v| is_truthy(v))?;

    let code = match value {
        Value::Number(n) => n.as_u64().or_else(|| whole_number(n.as_f64()?)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    let status = code
        .and_then(|c| u16::try_from(c).ok())
        .and_then(|c| StatusCode::from_u16(c).ok());

    if status.is_none() && code.is_some() {
        tracing::warn!(redirect = %value, "Redirect status out of range, using 302");
    }

    Some(status.unwrap_or(StatusCode::FOUND))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compile_requires_from_and_to() {
        assert!(matches!(
            Rule::compile(&RawRule::new("", "/x")),
            Err(RuleError::MissingFrom)
        ));
        assert!(matches!(
            Rule::compile(&RawRule::new("/x", "")),
            Err(RuleError::MissingTo)
        ));
        assert!(matches!(
            Rule::compile(&RawRule::default()),
            Err(RuleError::MissingFrom)
        ));
    }

    #[test]
    fn test_compile_rejects_non_string_fields() {
        let raw = RawRule {
            from: Some(json!(42)),
            to: Some(json!("/x")),
            ..RawRule::default()
        };
        assert!(matches!(Rule::compile(&raw), Err(RuleError::MissingFrom)));

        let raw = RawRule {
            from: Some(json!("/x")),
            to: Some(json!(["/y"])),
            ..RawRule::default()
        };
        assert!(matches!(Rule::compile(&raw), Err(RuleError::MissingTo)));
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        let err = Rule::compile(&RawRule::new("^/(unclosed", "/x")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
        assert!(err.to_string().contains("^/(unclosed"));
    }

    #[test]
    fn test_redirect_normalization() {
        let status = |value: Value| {
            Rule::compile(&RawRule::new("/a", "/b").with_redirect(value))
                .unwrap()
                .redirect()
        };

        assert_eq!(status(json!(301)), Some(StatusCode::MOVED_PERMANENTLY));
        assert_eq!(status(json!("307")), Some(StatusCode::TEMPORARY_REDIRECT));
        assert_eq!(status(json!(true)), Some(StatusCode::FOUND));
        assert_eq!(status(json!("yes")), Some(StatusCode::FOUND));
        assert_eq!(status(json!(5000)), Some(StatusCode::FOUND));
        assert_eq!(status(json!(301.0)), Some(StatusCode::MOVED_PERMANENTLY));
        assert_eq!(status(json!(301.5)), Some(StatusCode::FOUND));

        assert_eq!(status(json!(false)), None);
        assert_eq!(status(json!(0)), None);
        assert_eq!(status(json!("")), None);
        assert_eq!(status(Value::Null), None);
        assert_eq!(Rule::compile(&RawRule::new("/a", "/b")).unwrap().redirect(), None);
    }

    #[test]
    fn test_condition_normalization() {
        let rule = Rule::compile(&RawRule::new("/a", "/b")).unwrap();
        assert!(matches!(rule.condition(), Condition::Always));

        let mut raw = RawRule::new("/a", "/b");
        raw.condition = Some(json!(false));
        let rule = Rule::compile(&raw).unwrap();
        assert!(matches!(rule.condition(), Condition::Always));

        raw.condition = Some(json!(17));
        let rule = Rule::compile(&raw).unwrap();
        assert!(matches!(rule.condition(), Condition::Malformed(_)));

        let rule =
            Rule::compile(&RawRule::new("/a", "/b").with_condition("%{REQUEST_METHOD} ^GET$"))
                .unwrap();
        assert!(matches!(rule.condition(), Condition::Attribute { .. }));
    }

    #[test]
    fn test_display() {
        let rewrite = Rule::compile(&RawRule::new("^/old$", "/new")).unwrap();
        assert_eq!(rewrite.to_string(), "[REWRITE: ^/old$ -> /new]");

        let redirect = Rule::compile(&RawRule::new("^/old$", "/new").with_redirect(301)).unwrap();
        assert_eq!(redirect.to_string(), "[REDIRECT 301: ^/old$ -> /new]");
    }

    #[test]
    fn test_raw_rule_from_toml() {
        let raw: RawRule = toml::from_str(
            r#"
from = "^/old$"
to = "/new"
redirect = 301
condition = "%{REQUEST_METHOD} ^GET$"
"#,
        )
        .unwrap();

        assert_eq!(raw.from, Some(json!("^/old$")));
        assert_eq!(raw.redirect, Some(json!(301)));
        assert!(Rule::compile(&raw).unwrap().is_redirect());
    }
}
