//! Admin API for inspecting and changing rules at runtime.
//!
//! # Endpoints
//! - `GET /admin/status`: version and loaded rule count
//! - `GET /admin/rules`: rules in evaluation order
//! - `POST /admin/rules`: register a raw rule
//! - `DELETE /admin/rules`: remove every rule

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::get,
    Router,
};

use crate::rules::RuleStore;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<RuleStore>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(store: Arc<RuleStore>, api_key: &str) -> Self {
        Self {
            store,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route(
            "/admin/rules",
            get(list_rules).post(add_rule).delete(reset_rules),
        )
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
