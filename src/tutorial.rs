//! Guided-tour script types and the linear step sequencer.
//!
//! The sequencer is deliberately decoupled from rendering: it consumes
//! explicit events (a code snapshot or a named action) delivered by the
//! session, and only ever checks them against the single current step.
//! Completion is sticky for the session, whether reached by finishing
//! every step or by skipping.

use serde::{Deserialize, Serialize};

use crate::util::normalize_code;

/// Named user actions a step may wait for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TutorialAction {
  Run,
  RunSuccess,
  Next,
}

/// Where the step's tooltip sits relative to its anchor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
  Top,
  Bottom,
  Left,
  Right,
  Center,
}

/// A step's single optional gate. The `Option<StepGate>` on the step makes
/// "at most one gating condition" structural rather than validated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepGate {
  /// Advance automatically once the code buffer matches, whitespace ignored.
  Code(String),
  /// Advance when the named action happens while this step is current.
  Action(TutorialAction),
}

/// One entry of the fixed, ordered tutorial script.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TutorialStep {
  /// Anchor identifier the client positions the tooltip against.
  pub anchor: String,
  pub text: String,
  pub placement: Placement,
  #[serde(default)]
  pub gate: Option<StepGate>,
  /// Cosmetic: lets the client label the acknowledge button differently.
  #[serde(default)]
  pub final_step: bool,
}

/// Events delivered to the sequencer by the session.
#[derive(Clone, Debug)]
pub enum TutorialEvent {
  /// The learner's code buffer after an edit.
  CodeSnapshot(String),
  /// A named action performed elsewhere in the state machine.
  Action(TutorialAction),
}

/// Linear sequencer state: the current step index, or inactive.
#[derive(Clone, Debug, Default)]
pub struct Sequencer {
  step: Option<usize>,
  completed: bool,
}

impl Sequencer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Activate at step 0. A no-op once the session has completed the
  /// tutorial: re-loading the first mission must not restart it.
  pub fn begin(&mut self) {
    if !self.completed && self.step.is_none() {
      self.step = Some(0);
    }
  }

  pub fn is_active(&self) -> bool {
    self.step.is_some()
  }

  pub fn step_index(&self) -> Option<usize> {
    self.step
  }

  pub fn completed(&self) -> bool {
    self.completed
  }

  pub fn current<'a>(&self, script: &'a [TutorialStep]) -> Option<&'a TutorialStep> {
    self.step.and_then(|i| script.get(i))
  }

  /// Feed an event. Only the current step's gate is consulted.
  /// Returns true if the sequencer advanced.
  pub fn observe(&mut self, script: &[TutorialStep], event: &TutorialEvent) -> bool {
    let Some(step) = self.current(script) else { return false };
    let hit = match (&step.gate, event) {
      (Some(StepGate::Code(expected)), TutorialEvent::CodeSnapshot(code)) => {
        normalize_code(code) == normalize_code(expected)
      }
      (Some(StepGate::Action(wanted)), TutorialEvent::Action(done)) => wanted == done,
      _ => false,
    };
    if hit {
      self.advance(script);
    }
    hit
  }

  /// Explicit learner acknowledgment. Only an ungated step accepts it;
  /// gated steps advance through their gate alone.
  pub fn acknowledge(&mut self, script: &[TutorialStep]) -> bool {
    match self.current(script) {
      Some(step) if step.gate.is_none() => {
        self.advance(script);
        true
      }
      _ => false,
    }
  }

  /// Deactivate and mark the tutorial completed for the session.
  pub fn skip(&mut self) {
    self.step = None;
    self.completed = true;
  }

  /// True while the tutorial holds the "next mission" control hostage:
  /// active, and the current step is not the one waiting for `next`.
  pub fn next_mission_locked(&self, script: &[TutorialStep]) -> bool {
    match self.current(script) {
      Some(step) => step.gate != Some(StepGate::Action(TutorialAction::Next)),
      None => false,
    }
  }

  fn advance(&mut self, script: &[TutorialStep]) {
    let next = self.step.map_or(0, |i| i + 1);
    if next < script.len() {
      self.step = Some(next);
    } else {
      // Exhaustion completes the tutorial exactly once.
      self.step = None;
      self.completed = true;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::missions::tutorial_script;

  fn two_steps() -> Vec<TutorialStep> {
    vec![
      TutorialStep {
        anchor: "editor".into(),
        text: "type it".into(),
        placement: Placement::Top,
        gate: Some(StepGate::Code("mangoes = 5".into())),
        final_step: false,
      },
      TutorialStep {
        anchor: "run-button".into(),
        text: "run it".into(),
        placement: Placement::Top,
        gate: Some(StepGate::Action(TutorialAction::RunSuccess)),
        final_step: false,
      },
    ]
  }

  #[test]
  fn code_gate_is_whitespace_insensitive() {
    let script = two_steps();
    let mut seq = Sequencer::new();
    seq.begin();

    assert!(!seq.observe(&script, &TutorialEvent::CodeSnapshot("mangoes = 6".into())));
    assert_eq!(seq.step_index(), Some(0));

    assert!(seq.observe(&script, &TutorialEvent::CodeSnapshot("mangoes=5\n  ".into())));
    assert_eq!(seq.step_index(), Some(1));
  }

  #[test]
  fn action_gate_only_checks_current_step() {
    let script = two_steps();
    let mut seq = Sequencer::new();
    seq.begin();

    // RunSuccess gates step 1, not step 0; nothing should move.
    assert!(!seq.observe(&script, &TutorialEvent::Action(TutorialAction::RunSuccess)));
    assert_eq!(seq.step_index(), Some(0));
  }

  #[test]
  fn gated_steps_reject_acknowledgment() {
    let script = two_steps();
    let mut seq = Sequencer::new();
    seq.begin();
    assert!(!seq.acknowledge(&script));
    assert_eq!(seq.step_index(), Some(0));
  }

  #[test]
  fn exhaustion_completes_and_sticks() {
    let script = two_steps();
    let mut seq = Sequencer::new();
    seq.begin();
    seq.observe(&script, &TutorialEvent::CodeSnapshot("mangoes = 5".into()));
    seq.observe(&script, &TutorialEvent::Action(TutorialAction::RunSuccess));

    assert!(!seq.is_active());
    assert!(seq.completed());

    // A later mission-0 reload must not restart it.
    seq.begin();
    assert!(!seq.is_active());
  }

  #[test]
  fn skip_completes_and_sticks() {
    let script = two_steps();
    let mut seq = Sequencer::new();
    seq.begin();
    seq.skip();
    assert!(!seq.is_active());
    assert!(seq.completed());
    seq.begin();
    assert!(!seq.is_active());
  }

  #[test]
  fn next_mission_lock_follows_current_gate() {
    let script = tutorial_script();
    let mut seq = Sequencer::new();
    seq.begin();
    // Step 0 of the built-in script is ungated: next stays locked.
    assert!(seq.next_mission_locked(&script));

    // Walk to the last step, which waits for the `next` action.
    while seq.is_active() {
      let step = seq.current(&script).unwrap().clone();
      match step.gate {
        None => {
          seq.acknowledge(&script);
        }
        Some(StepGate::Code(code)) => {
          seq.observe(&script, &TutorialEvent::CodeSnapshot(code));
        }
        Some(StepGate::Action(a)) => {
          if a == TutorialAction::Next {
            break;
          }
          seq.observe(&script, &TutorialEvent::Action(a));
        }
      }
    }
    assert!(seq.is_active());
    assert!(!seq.next_mission_locked(&script));

    seq.observe(&script, &TutorialEvent::Action(TutorialAction::Next));
    assert!(seq.completed());
  }

  #[test]
  fn built_in_script_has_at_most_one_gate_each() {
    for step in tutorial_script() {
      // Structural by type, but keep the catalog honest about anchors too.
      assert!(!step.anchor.is_empty());
      assert!(!step.text.is_empty());
    }
  }

  #[test]
  fn step_gate_toml_shapes() {
    let code: TutorialStep = toml::from_str(
      r#"
        anchor = "editor"
        text = "type it"
        placement = "top"
        gate = { code = "mangoes = 5" }
      "#,
    )
    .unwrap();
    assert_eq!(code.gate, Some(StepGate::Code("mangoes = 5".into())));

    let action: TutorialStep = toml::from_str(
      r#"
        anchor = "run-button"
        text = "run it"
        placement = "top"
        gate = { action = "run-success" }
      "#,
    )
    .unwrap();
    assert_eq!(action.gate, Some(StepGate::Action(TutorialAction::RunSuccess)));
  }
}
