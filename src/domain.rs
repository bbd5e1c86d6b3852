//! Domain models: game phases, lessons, verdicts, and transcript entries.

use serde::{Deserialize, Serialize};

/// Where the session is in its journey. A closed set: every consumer
/// matches exhaustively so an invalid phase cannot be rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
  /// Initial phase, before the learner presses start.
  Welcome,
  /// A mission is being fetched from the model.
  LoadingLevel,
  /// The lesson is on screen; the learner can edit and run code.
  Lesson,
  /// A submission is being judged by the model.
  Evaluating,
  /// The last submission was correct; next mission is offered.
  Success,
  /// A gateway call failed; the learner must re-trigger the action.
  Error,
  /// The mission catalog is exhausted. Terminal.
  GameOver,
}

impl GamePhase {
  /// True while an asynchronous gateway call is outstanding.
  /// No other mutating trigger is accepted in these phases.
  pub const fn is_busy(&self) -> bool {
    matches!(self, Self::LoadingLevel | Self::Evaluating)
  }

  pub const fn is_terminal(&self) -> bool {
    matches!(self, Self::GameOver)
  }
}

/// One mission's teaching content. Immutable once fetched, except that
/// `example` may be swapped in place by an example refresh.
///
/// Deserialized straight from the model's JSON: every field is required,
/// so a payload missing any of the seven fails the parse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
  pub title: String,
  pub story: String,
  pub explanation: String,
  pub example: String,
  pub challenge: String,
  pub solution: String,
  pub hint: String,
}

/// The model's judgement of a submission. Transient: consumed immediately
/// to pick the next phase and build a transcript entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationVerdict {
  #[serde(rename = "isCorrect")]
  pub is_correct: bool,
  pub feedback: String,
}

/// One entry in the console transcript. Append-only and immutable once
/// appended; rendering preserves insertion order exactly.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranscriptEntry {
  /// Plain narration line.
  Narration { text: String },
  /// Structured feedback for an incorrect submission: what the model said,
  /// what the learner wrote, and the reference solution for comparison.
  Feedback {
    feedback: String,
    user_code: String,
    solution_code: String,
  },
}

impl TranscriptEntry {
  pub fn narration(text: impl Into<String>) -> Self {
    Self::Narration { text: text.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phase_busy_set() {
    assert!(GamePhase::LoadingLevel.is_busy());
    assert!(GamePhase::Evaluating.is_busy());
    assert!(!GamePhase::Lesson.is_busy());
    assert!(!GamePhase::Welcome.is_busy());
    assert!(!GamePhase::Error.is_busy());
  }

  #[test]
  fn only_game_over_is_terminal() {
    assert!(GamePhase::GameOver.is_terminal());
    assert!(!GamePhase::Error.is_terminal());
    assert!(!GamePhase::Success.is_terminal());
  }

  #[test]
  fn phase_serialization() {
    assert_eq!(serde_json::to_string(&GamePhase::LoadingLevel).unwrap(), r#""loading_level""#);
    assert_eq!(serde_json::to_string(&GamePhase::GameOver).unwrap(), r#""game_over""#);
  }

  #[test]
  fn lesson_requires_all_seven_fields() {
    let missing_solution = r#"{
      "title": "Variables: The Naming Ceremony",
      "story": "s", "explanation": "e", "example": "x",
      "challenge": "c", "hint": "h"
    }"#;
    let err = serde_json::from_str::<Lesson>(missing_solution).unwrap_err();
    assert!(err.to_string().contains("solution"));

    let full = r#"{
      "title": "t", "story": "s", "explanation": "e", "example": "x",
      "challenge": "c", "solution": "sol", "hint": "h"
    }"#;
    assert!(serde_json::from_str::<Lesson>(full).is_ok());
  }

  #[test]
  fn verdict_uses_camel_case_flag() {
    let v: EvaluationVerdict =
      serde_json::from_str(r#"{"isCorrect": true, "feedback": "Well done, Yodha!"}"#).unwrap();
    assert!(v.is_correct);
  }

  #[test]
  fn transcript_entry_tagging() {
    let json = serde_json::to_string(&TranscriptEntry::narration("hello")).unwrap();
    assert!(json.contains(r#""type":"narration""#));

    let fb = TranscriptEntry::Feedback {
      feedback: "close".into(),
      user_code: "x = 1".into(),
      solution_code: "x = 2".into(),
    };
    let json = serde_json::to_string(&fb).unwrap();
    assert!(json.contains(r#""type":"feedback""#));
    assert!(json.contains("solution_code"));
  }
}
