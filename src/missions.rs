//! Built-in content: the ordered mission topic catalog and the guided-tour
//! script shown on the first mission. Both can be overridden from the TOML
//! config; these defaults keep the app playable without one.

use crate::tutorial::{Placement, StepGate, TutorialAction, TutorialStep};

/// The fixed mission catalog, in teaching order. The index into this list
/// is the session's mission index.
pub fn mission_topics() -> Vec<String> {
  [
    "Variables & Data Types: The Naming Ceremony",
    "Working with Numbers: The Village Abacus",
    "String Manipulation: Crafting Powerful Phrases",
    "Lists: The Army Formation",
    "Conditional Logic: The Path of Wisdom",
    "For Loops: The Sacred Ritual",
    "Functions: The Celestial Tools",
    "Dictionaries: The Royal Treasury",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

fn step(anchor: &str, text: &str, placement: Placement, gate: Option<StepGate>) -> TutorialStep {
  TutorialStep {
    anchor: anchor.into(),
    text: text.into(),
    placement,
    gate,
    final_step: false,
  }
}

/// The first-mission walkthrough. Steps 0-4 are ungated reading steps; the
/// rest gate on typed code or on actions performed in the main flow.
pub fn tutorial_script() -> Vec<TutorialStep> {
  vec![
    step(
      "welcome-tutorial",
      "Pranam, Yodha! I am your Guru. For your first mission, I will guide your hand and teach you the ways of code.",
      Placement::Center,
      None,
    ),
    step(
      "mission",
      "First, read your Mission. This tells you the story and the goal of your task.",
      Placement::Right,
      None,
    ),
    step(
      "teaching",
      "Next, read the Teaching. Here, I explain the new concept, like a variable being a 'potli' (pouch) to hold a value.",
      Placement::Right,
      None,
    ),
    step(
      "example",
      "This is an example code. See how it works. The '#' comments explain each line.",
      Placement::Right,
      None,
    ),
    step(
      "test",
      "Finally, this is your Test. It tells you exactly what code you must write to succeed.",
      Placement::Right,
      None,
    ),
    step(
      "editor",
      "This is your scroll. Type your code here. Type exactly this and we will continue:\nmangoes = 5",
      Placement::Top,
      Some(StepGate::Code("mangoes = 5".into())),
    ),
    step(
      "editor",
      "Excellent! Now press Enter for a new line and type:\nprint(mangoes)",
      Placement::Top,
      Some(StepGate::Code("mangoes = 5\nprint(mangoes)".into())),
    ),
    step(
      "run-button",
      "Shabash! Your code is complete. Now, click 'Run Code' to present it for evaluation.",
      Placement::Top,
      Some(StepGate::Action(TutorialAction::RunSuccess)),
    ),
    TutorialStep {
      anchor: "next-button".into(),
      text: "Vijayi Bhava! You have succeeded! Click 'Next Level' to continue your great journey.".into(),
      placement: Placement::Top,
      gate: Some(StepGate::Action(TutorialAction::Next)),
      final_step: true,
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn catalog_is_nonempty_and_ordered() {
    let topics = mission_topics();
    assert_eq!(topics.len(), 8);
    assert!(topics[0].starts_with("Variables"));
  }

  #[test]
  fn script_ends_on_the_next_gate() {
    let script = tutorial_script();
    let last = script.last().unwrap();
    assert_eq!(last.gate, Some(StepGate::Action(TutorialAction::Next)));
    assert!(last.final_step);
  }
}
