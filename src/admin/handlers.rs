use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::rules::{RawRule, Rule};

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub rules: usize,
}

/// Rule as reported by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleView {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<u16>,
}

impl From<&Rule> for RuleView {
    fn from(rule: &Rule) -> Self {
        Self {
            from: rule.from().as_str().to_string(),
            to: rule.to().to_string(),
            condition: rule.condition().as_str().map(str::to_string),
            redirect: rule.redirect().map(|s| s.as_u16()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        rules: state.store.len(),
    })
}

pub async fn list_rules(State(state): State<AdminState>) -> Json<Vec<RuleView>> {
    let rules = state.store.list();
    Json(rules.iter().map(RuleView::from).collect())
}

pub async fn add_rule(
    State(state): State<AdminState>,
    Json(raw): Json<RawRule>,
) -> (StatusCode, Json<RegisterResponse>) {
    match state.store.try_register(&raw) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                registered: true,
                error: None,
            }),
        ),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(RegisterResponse {
                registered: false,
                error: Some(e.to_string()),
            }),
        ),
    }
}

pub async fn reset_rules(State(state): State<AdminState>) -> StatusCode {
    state.store.reset();
    tracing::info!("All rewrite rules removed via admin API");
    StatusCode::NO_CONTENT
}
