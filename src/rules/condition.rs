//! Rule conditions.
//!
//! # Responsibilities
//! - Parse the `%{REQUEST_<ATTR>} <PATTERN>` condition grammar
//! - Resolve request attributes by name
//! - Evaluate a parsed condition against a request
//!
//! # Design Decisions
//! - Parsed once at registration, never at dispatch time
//! - Only a fixed attribute set is exposed: method, url, path, query and
//!   request headers. There is no dynamic field lookup.
//! - A condition that does not parse is kept as `Malformed` and never passes

use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;

use axum::http::Request;
use regex::Regex;

/// First line of the form `%{REQUEST_<ATTR>} <PATTERN>`.
const CONDITION_GRAMMAR: &str = r"(?mR)^%\{REQUEST_([A-Za-z0-9_]+)\} (.+)$";

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| Regex::new(CONDITION_GRAMMAR).expect("condition grammar must compile"))
}

/// Gate evaluated before a rule's path pattern.
#[derive(Debug, Clone)]
pub enum Condition {
    /// No condition configured; always passes.
    Always,

    /// Request attribute `name` must match `pattern`.
    Attribute {
        raw: String,
        name: String,
        pattern: Regex,
    },

    /// Condition text that did not fit the grammar; never passes.
    Malformed(String),
}

impl Condition {
    /// Parse a condition string.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Condition::Always;
        }

        let Some(caps) = grammar().captures(text) else {
            return Condition::Malformed(text.to_string());
        };

        let name = caps[1].to_ascii_lowercase();
        match Regex::new(&format!("(?m){}", &caps[2])) {
            Ok(pattern) => Condition::Attribute {
                raw: text.to_string(),
                name,
                pattern,
            },
            Err(e) => {
                tracing::warn!(condition = %text, error = %e, "Condition pattern does not compile");
                Condition::Malformed(text.to_string())
            }
        }
    }

    /// Returns true if the request satisfies this condition.
    pub fn evaluate<R: RequestAttributes + ?Sized>(&self, req: &R) -> bool {
        match self {
            Condition::Always => true,
            Condition::Attribute { name, pattern, .. } => req
                .attribute(name)
                .is_some_and(|value| pattern.is_match(&value)),
            Condition::Malformed(_) => false,
        }
    }

    /// Original condition text, `None` when unconditional.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Condition::Always => None,
            Condition::Attribute { raw, .. } | Condition::Malformed(raw) => Some(raw),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("No condition"))
    }
}

/// Read access to the parts of a request that rules can inspect.
pub trait RequestAttributes {
    /// HTTP method, e.g. `GET`.
    fn request_method(&self) -> &str;

    /// Path plus query string.
    fn request_url(&self) -> &str;

    /// Header value by name (case-insensitive).
    fn header_value(&self, name: &str) -> Option<&str>;

    /// Resolve a lowercased condition attribute.
    ///
    /// `method`, `url` (alias `uri`), `path` and `query` map to the request
    /// line. Anything else is looked up as a header, first with `_` turned
    /// into `-` (`user_agent` reads `User-Agent`), then verbatim.
    fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "method" => Some(Cow::Borrowed(self.request_method())),
            "url" | "uri" => Some(Cow::Borrowed(self.request_url())),
            "path" => {
                let url = self.request_url();
                Some(Cow::Borrowed(url.split_once('?').map_or(url, |(path, _)| path)))
            }
            "query" => self
                .request_url()
                .split_once('?')
                .map(|(_, query)| Cow::Borrowed(query)),
            _ => {
                let dashed = name.replace('_', "-");
                self.header_value(&dashed)
                    .or_else(|| self.header_value(name))
                    .map(Cow::Borrowed)
            }
        }
    }
}

impl<B> RequestAttributes for Request<B> {
    fn request_method(&self) -> &str {
        self.method().as_str()
    }

    fn request_url(&self) -> &str {
        let uri = self.uri();
        uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str())
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers().get(name).and_then(|v| v.to_str().ok())
    }
}

/// Plain request description for callers outside an HTTP stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParts {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl RequestParts {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl RequestAttributes for RequestParts {
    fn request_method(&self) -> &str {
        &self.method
    }

    fn request_url(&self) -> &str {
        &self.url
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
