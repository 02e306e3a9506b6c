use axum::{extract::State, response::Json};

use crate::error::ApiError;
use crate::intent::Intent;
use crate::AppState;

/// `POST /api/parse-query`, body `{ "query": "..." }`.
///
/// 400 when `query` is missing, not a string, or empty; otherwise 200 with
/// the parsed Intent. Which strategy produced it is invisible to the caller.
pub async fn parse_query(
    State(state): State<AppState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Json<Intent>, ApiError> {
    let query = request
        .get("query")
        .and_then(|v| v.as_str())
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("query string required".to_string()))?;

    let intent = state.intent_parser.parse(query).await;

    Ok(Json(intent))
}
