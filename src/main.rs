//! Guru · Code Quest Backend
//!
//! - Axum HTTP + WebSocket API driving the lesson/game state machine
//! - Model gateway for lesson generation, example refresh, and evaluation
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   OPENAI_API_KEY     : REQUIRED; startup fails without it
//!   OPENAI_BASE_URL    : default "https://api.openai.com/v1"
//!   OPENAI_FAST_MODEL  : default "gpt-4o-mini" (alternate examples)
//!   OPENAI_STRONG_MODEL: default "gpt-4o" (lessons + evaluation)
//!   AGENT_CONFIG_PATH  : path to TOML config (prompts, catalog, tutorial, policy)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod missions;
mod tutorial;
mod session;
mod state;
mod protocol;
mod logic;
mod openai;
mod routes;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (session store, gateway, prompts).
  // A missing API key refuses to launch here rather than failing later.
  let state = match AppState::new() {
    Ok(state) => state,
    Err(e) => {
      error!(target: "guru_backend", error = %e, "Startup aborted");
      return Err(e.into());
    }
  };

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state);

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "guru_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
