//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use serde_json::Value;

use http_rewrite::observability::SilentLogger;
use http_rewrite::{RawRule, RuleStore};

/// Store with the given rules and logging disabled.
pub fn store(rules: Vec<RawRule>) -> Arc<RuleStore> {
    Arc::new(RuleStore::new(rules, Arc::new(SilentLogger)))
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
