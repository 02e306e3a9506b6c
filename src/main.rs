use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use franchise_relay_backend::config::{AppConfig, UPSTREAM_TIMEOUT};
use franchise_relay_backend::generation::{GeminiClient, IntentGenerator};
use franchise_relay_backend::intent_parser::IntentParser;
use franchise_relay_backend::{api, health_check, AppState};

// Some client payloads embed base64 documents in the chat messages.
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Arc::new(AppConfig::from_env());

    let http = reqwest::Client::builder()
        .timeout(UPSTREAM_TIMEOUT)
        .build()?;

    // A missing Gemini key is not an error: the parser just runs the
    // rule-based extractor for every query.
    let generator: Option<Arc<dyn IntentGenerator>> = if config.model_strategy_enabled() {
        let key = config.gemini_api_key.clone().unwrap_or_default();
        Some(Arc::new(GeminiClient::new(http.clone(), &config, key)))
    } else {
        info!("GEMINI_API_KEY not set, intent parsing uses the rule-based extractor only");
        None
    };
    let intent_parser = Arc::new(IntentParser::new(generator));

    let app_state = AppState {
        config: config.clone(),
        http,
        intent_parser,
    };

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/claude", post(api::relay::relay_claude))
        .route("/api/tavily", post(api::relay::relay_tavily))
        .route("/api/parse-query", post(api::parse::parse_query))
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("relay backend running on http://0.0.0.0:{}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
