//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Unknown sessions are 404; guard-rejected triggers are 409 with a message.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument};

use crate::logic;
use crate::protocol::{to_out, ErrorOut, HealthOut, SetCodeIn, SessionOut};
use crate::session::GameSession;
use crate::state::{AppState, SharedSession};

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

fn snapshot(state: &AppState, s: &GameSession) -> Json<SessionOut> {
  Json(to_out(s, &state.missions, &state.tutorial))
}

fn not_found(id: &str) -> Response {
  let body = ErrorOut { message: format!("Unknown session: {}", id) };
  (StatusCode::NOT_FOUND, Json(body)).into_response()
}

fn rejected(message: String) -> Response {
  (StatusCode::CONFLICT, Json(ErrorOut { message })).into_response()
}

async fn lookup(state: &AppState, id: &str) -> Result<SharedSession, Response> {
  state.get_session(id).await.ok_or_else(|| not_found(id))
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_session(State(state): State<AppState>) -> Response {
  let session = state.create_session().await;
  let s = session.lock().await;
  info!(target: "mission", id = %s.id, "HTTP session created");
  snapshot(&state, &s).into_response()
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let s = session.lock().await;
      snapshot(&state, &s).into_response()
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_start(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::start_game(&state, &mut s).await {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state, body), fields(%id, code_len = body.code.len()))]
pub async fn http_set_code(
  State(state): State<AppState>,
  Path(id): Path<String>,
  Json(body): Json<SetCodeIn>,
) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      logic::set_code(&state, &mut s, body.code);
      snapshot(&state, &s).into_response()
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_run_code(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::run_code(&state, &mut s).await {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_next_mission(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::next_mission(&state, &mut s).await {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_hint(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::hint(&mut s) {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_refresh_example(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::refresh_example(&state, &mut s).await {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_solution_to_editor(
  State(state): State<AppState>,
  Path(id): Path<String>,
) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::solution_to_editor(&state, &mut s) {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_animation_done(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      logic::animation_done(&mut s);
      snapshot(&state, &s).into_response()
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_tutorial_next(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::tutorial_next(&state, &mut s) {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_tutorial_skip(State(state): State<AppState>, Path(id): Path<String>) -> Response {
  match lookup(&state, &id).await {
    Ok(session) => {
      let mut s = session.lock().await;
      match logic::tutorial_skip(&mut s) {
        Ok(()) => snapshot(&state, &s).into_response(),
        Err(message) => rejected(message),
      }
    }
    Err(resp) => resp,
  }
}
