//! HTTP endpoints
//!
//! `POST /chat` is the whole product; the rest is a demo page, the catalog
//! dump the website's map view reads, and a health probe.

use axum::{
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use realty_agent::replies;

use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_origins);

    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/all-properties", get(all_properties))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// CORS from configured origins; an empty list means a public widget and
/// stays permissive.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(%origin, "Invalid CORS origin, skipping");
                None
            })
        })
        .collect();

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Omitted on the first message; the reply carries the minted id the
    /// client must echo from then on.
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let message = request.message.trim();
    let response = if message.is_empty() {
        replies::WELCOME.to_string()
    } else {
        state.engine.handle(&session_id, message).await
    };

    Json(ChatResponse {
        response,
        session_id,
    })
}

/// Full catalog snapshot for the map view. 404 until the first refresh lands.
async fn all_properties(State(state): State<AppState>) -> impl IntoResponse {
    match state.catalog.get() {
        Some(listings) => (
            StatusCode::OK,
            Json(json!({
                "properties": &*listings,
                "count": listings.len(),
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Catalog not loaded yet"})),
        ),
    }
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
