//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (one game session per connection)
/// - REST-ish API under `/api/v1/...` for clients that manage sessions by id
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: AppState) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/session", post(http::http_create_session))
        .route("/api/v1/session/:id", get(http::http_get_session))
        .route("/api/v1/session/:id/start", post(http::http_start))
        .route("/api/v1/session/:id/code", post(http::http_set_code))
        .route("/api/v1/session/:id/run", post(http::http_run_code))
        .route("/api/v1/session/:id/next", post(http::http_next_mission))
        .route("/api/v1/session/:id/hint", post(http::http_hint))
        .route("/api/v1/session/:id/refresh_example", post(http::http_refresh_example))
        .route("/api/v1/session/:id/solution_to_editor", post(http::http_solution_to_editor))
        .route("/api/v1/session/:id/animation_done", post(http::http_animation_done))
        .route("/api/v1/session/:id/tutorial/next", post(http::http_tutorial_next))
        .route("/api/v1/session/:id/tutorial/skip", post(http::http_tutorial_skip))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
