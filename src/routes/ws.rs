//! WebSocket upgrade + message loop. Each connection owns one game session;
//! client messages are parsed as JSON, dispatched to core logic one at a
//! time, and answered with either a full session snapshot or an error.
//! Processing one message to completion before reading the next is what
//! serializes the session's suspend-resume cycles.

use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic;
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::state::{AppState, SharedSession};

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
  info!(target: "guru_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: AppState) {
  let session = state.create_session().await;
  let session_id = { session.lock().await.id.clone() };
  info!(target: "guru_backend", %session_id, "WebSocket connected");

  // Greet with the welcome snapshot so the client can render immediately.
  {
    let s = session.lock().await;
    let hello = ServerWsMessage::Session { session: to_out(&s, &state.missions, &state.tutorial) };
    drop(s);
    if send_json(&mut socket, &hello).await.is_err() {
      state.remove_session(&session_id).await;
      return;
    }
  }

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "guru_backend", %session_id, "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &session).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        if send_json(&mut socket, &reply_msg).await.is_err() {
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }

  state.remove_session(&session_id).await;
  info!(target: "guru_backend", %session_id, "WebSocket disconnected");
}

async fn send_json(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), ()> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await.map_err(|e| {
    error!(target: "guru_backend", error = %e, "WS send error");
  })
}

#[instrument(level = "info", skip(state, session))]
async fn handle_client_ws(
  msg: ClientWsMessage,
  state: &AppState,
  session: &SharedSession,
) -> ServerWsMessage {
  let mut s = session.lock().await;

  let result = match msg {
    ClientWsMessage::Ping => return ServerWsMessage::Pong,
    ClientWsMessage::Start => logic::start_game(state, &mut s).await,
    ClientWsMessage::SetCode { code } => {
      logic::set_code(state, &mut s, code);
      Ok(())
    }
    ClientWsMessage::RunCode => logic::run_code(state, &mut s).await,
    ClientWsMessage::NextMission => logic::next_mission(state, &mut s).await,
    ClientWsMessage::Hint => logic::hint(&mut s),
    ClientWsMessage::RefreshExample => logic::refresh_example(state, &mut s).await,
    ClientWsMessage::SolutionToEditor => logic::solution_to_editor(state, &mut s),
    ClientWsMessage::AnimationDone => {
      logic::animation_done(&mut s);
      Ok(())
    }
    ClientWsMessage::TutorialNext => logic::tutorial_next(state, &mut s),
    ClientWsMessage::TutorialSkip => logic::tutorial_skip(&mut s),
  };

  match result {
    Ok(()) => ServerWsMessage::Session { session: to_out(&s, &state.missions, &state.tutorial) },
    Err(message) => ServerWsMessage::Error { message },
  }
}
