pub mod api;
pub mod config;
pub mod error;
pub mod generation;
pub mod intent;
pub mod intent_parser;

use axum::response::Json;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::intent_parser::IntentParser;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
    pub intent_parser: Arc<IntentParser>,
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "franchise relay backend running"
    }))
}
