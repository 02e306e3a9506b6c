use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Deserialize)]
pub struct ClaudeRelayRequest {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    pub data: serde_json::Value,
}

/// Forward a chat-completion payload to the Anthropic messages API and hand
/// the upstream JSON body back with the upstream status code. No retries,
/// no response validation beyond JSON parsing.
pub async fn relay_claude(
    State(state): State<AppState>,
    Json(request): Json<ClaudeRelayRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let message_count = request
        .data
        .get("messages")
        .and_then(|m| m.as_array())
        .map(|m| m.len())
        .unwrap_or(0);
    info!("claude relay request, {message_count} messages");

    let response = state
        .http
        .post(&state.config.claude_api_url)
        .header("x-api-key", request.api_key.unwrap_or_default())
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&request.data)
        .send()
        .await
        .map_err(|e| upstream_error("claude", e))?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| upstream_error("claude", e))?;

    info!(
        "claude relay response: status {}, {} content blocks, stop_reason {:?}, {} output tokens",
        status,
        body.get("content").and_then(|c| c.as_array()).map(|c| c.len()).unwrap_or(0),
        body.get("stop_reason").and_then(|s| s.as_str()),
        body.pointer("/usage/output_tokens")
            .and_then(|t| t.as_u64())
            .unwrap_or(0),
    );

    Ok((
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
        Json(body),
    ))
}

/// Forward the body verbatim to the Tavily search API.
pub async fn relay_tavily(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    info!(
        "tavily search request for: {:?}",
        body.get("query").and_then(|q| q.as_str())
    );

    let response = state
        .http
        .post(&state.config.tavily_api_url)
        .json(&body)
        .send()
        .await
        .map_err(|e| upstream_error("tavily", e))?;

    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| upstream_error("tavily", e))?;

    info!(
        "tavily returned {} results",
        body.get("results").and_then(|r| r.as_array()).map(|r| r.len()).unwrap_or(0)
    );

    Ok((
        StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
        Json(body),
    ))
}

fn upstream_error(upstream: &str, err: reqwest::Error) -> ApiError {
    warn!("{upstream} relay failed: {err}");
    // The caller gets the message string only, never the transport detail chain.
    ApiError::Upstream(err.to_string())
}
