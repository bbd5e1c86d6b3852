//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{GamePhase, Lesson, TranscriptEntry};
use crate::session::GameSession;
use crate::tutorial::TutorialStep;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  /// Leave the welcome screen and load mission 0 (also the retry trigger
  /// after a failed load).
  Start,
  /// The code buffer changed; the tutorial sees every snapshot.
  SetCode {
    code: String,
  },
  RunCode,
  NextMission,
  Hint,
  RefreshExample,
  SolutionToEditor,
  AnimationDone,
  TutorialNext,
  TutorialSkip,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  /// Full session snapshot; sent after every accepted action.
  Session {
    session: SessionOut,
  },
  Error {
    message: String,
  },
}

/// Tutorial slice of the snapshot.
#[derive(Debug, Serialize)]
pub struct TutorialOut {
  pub active: bool,
  pub step_index: Option<usize>,
  pub step: Option<TutorialStep>,
  pub completed: bool,
  /// True while the tutorial holds the next-mission control back.
  pub next_mission_locked: bool,
}

/// DTO used by both WS and HTTP for session delivery.
#[derive(Debug, Serialize)]
pub struct SessionOut {
  pub id: String,
  pub phase: GamePhase,
  pub mission_index: usize,
  pub mission_count: usize,
  pub topic: Option<String>,
  pub is_last_mission: bool,
  pub lesson: Option<Lesson>,
  pub user_code: String,
  pub transcript: Vec<TranscriptEntry>,
  pub refreshing_example: bool,
  pub animated_solution: Option<String>,
  pub tutorial: TutorialOut,
}

/// Convert the internal session to the public DTO.
pub fn to_out(s: &GameSession, missions: &[String], script: &[TutorialStep]) -> SessionOut {
  SessionOut {
    id: s.id.clone(),
    phase: s.phase,
    mission_index: s.mission_index,
    mission_count: missions.len(),
    topic: missions.get(s.mission_index).cloned(),
    is_last_mission: s.mission_index + 1 == missions.len(),
    lesson: s.lesson.clone(),
    user_code: s.user_code.clone(),
    transcript: s.transcript.clone(),
    refreshing_example: s.refresh_in_flight,
    animated_solution: s.animated_solution.clone(),
    tutorial: TutorialOut {
      active: s.tutorial.is_active(),
      step_index: s.tutorial.step_index(),
      step: s.tutorial.current(script).cloned(),
      completed: s.tutorial.completed(),
      next_mission_locked: s.tutorial.next_mission_locked(script),
    },
  }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SetCodeIn {
  pub code: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
  pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::missions::{mission_topics, tutorial_script};

  #[test]
  fn client_messages_parse() {
    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::Start));

    let m: ClientWsMessage =
      serde_json::from_str(r#"{"type":"set_code","code":"mangoes = 5"}"#).unwrap();
    match m {
      ClientWsMessage::SetCode { code } => assert_eq!(code, "mangoes = 5"),
      other => panic!("unexpected {other:?}"),
    }

    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"tutorial_skip"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::TutorialSkip));
  }

  #[test]
  fn snapshot_reflects_session() {
    let missions = mission_topics();
    let script = tutorial_script();
    let s = GameSession::new("s1");
    let out = to_out(&s, &missions, &script);

    assert_eq!(out.id, "s1");
    assert_eq!(out.mission_count, 8);
    assert_eq!(out.topic.as_deref(), Some("Variables & Data Types: The Naming Ceremony"));
    assert!(!out.is_last_mission);
    assert!(out.lesson.is_none());
    assert_eq!(out.transcript.len(), 1);
    assert!(!out.tutorial.active);

    let json = serde_json::to_string(&ServerWsMessage::Session { session: out }).unwrap();
    assert!(json.contains(r#""type":"session""#));
    assert!(json.contains(r#""phase":"welcome""#));
  }
}
