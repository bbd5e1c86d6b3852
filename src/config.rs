//! Loading agent configuration from TOML: prompt templates, an optional
//! mission-catalog override, an optional tutorial-script override, and
//! gameplay policy knobs.
//!
//! See `AgentConfig` and `Prompts` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::tutorial::TutorialStep;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  /// Replacement mission topic catalog. Empty means "use the built-ins".
  #[serde(default)]
  pub missions: Vec<String>,
  /// Replacement tutorial script. Empty means "use the built-ins".
  #[serde(default)]
  pub tutorial: Vec<TutorialStep>,
  #[serde(default)]
  pub policy: Policy,
}

/// Gameplay policy knobs.
#[derive(Clone, Debug, Deserialize)]
pub struct Policy {
  /// How many example refreshes a mission allows before the Guru stops
  /// generating alternatives and reveals the full solution instead.
  #[serde(default = "default_refresh_limit")]
  pub example_refresh_limit: u32,
}

fn default_refresh_limit() -> u32 {
  3
}

impl Default for Policy {
  fn default() -> Self {
    Self { example_refresh_limit: default_refresh_limit() }
  }
}

/// Prompts used by the model gateway. Defaults carry the Guru persona;
/// override them in TOML to tune tone or structure.
#[derive(Clone, Debug, Deserialize)]
pub struct Prompts {
  // Lesson generation
  pub lesson_system: String,
  pub lesson_user_template: String,
  // Alternate-example refresh
  pub refresh_system: String,
  pub refresh_user_template: String,
  // Submission evaluation
  pub eval_system: String,
  pub eval_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      lesson_system: "You are an AI Guru, a wise sage from ancient India, teaching a young 'Yodha' (warrior) the art of Python programming. Your student is roughly an 8th-grade student, so your language must be very simple, clear, and encouraging. Use analogies from Indian culture, epics (like Ramayana, Mahabharata), folklore, or simple village life. For example, a variable is a 'potli' (pouch) to store something. A list is a 'mala' (garland) of flowers. HOWEVER, all UI text (titles, challenges, hints) must be in simple, plain English; keep the theme in the storytelling and analogies, not in the core instructions. Respond ONLY with a strict JSON object, no markdown formatting.".into(),
      lesson_user_template: "Create the lesson for Mission {mission_number}, focusing on the topic: '{topic}'.\nThe JSON object must have exactly these string fields:\n- \"title\": a mission title in simple English, using the theme as flavor. Example: \"Variables: The Naming Ceremony\".\n- \"story\": a short, engaging story (2-3 sentences) setting the scene for the Yodha's mission.\n- \"explanation\": a very simple explanation of the concept using a relatable Indian analogy, but with technical terms in English.\n- \"example\": a small, complete Python code snippet. It MUST be heavily commented: add a '#' comment to EVERY line explaining what it does in simple terms.\n- \"challenge\": a clear, simple coding task for the Yodha, continuing the story, in plain English.\n- \"solution\": the correct, complete Python code to solve the challenge.\n- \"hint\": a small, encouraging hint in plain English.".into(),
      refresh_system: "You are an AI Guru helping a young Yodha who is confused. Respond ONLY with a strict JSON object, no markdown formatting.".into(),
      refresh_user_template: "The topic of the lesson is: '{topic}'.\nThe Yodha did not understand this example:\n{old_example}\n\nProvide a NEW, DIFFERENT, and even SIMPLER example for the same topic. Use another analogy from Indian culture or folklore. The new example must be a complete, runnable Python snippet, with a '#' comment on EVERY single line explaining it in the simplest possible terms.\nReturn a JSON object containing only the 'example' key.".into(),
      eval_system: "You are a wise and encouraging AI Guru reviewing code submitted by your student, a young Yodha. Respond ONLY with a strict JSON object, no markdown formatting.".into(),
      eval_user_template: "The Yodha is trying to solve this challenge: '{challenge}'.\nThe ideal solution is:\n{solution}\nThe Yodha submitted this code:\n{user_code}\n\nAnalyze the Yodha's code. Does it correctly solve the challenge?\nReturn JSON: {\"isCorrect\": boolean, \"feedback\": string}.\n- If the code is correct, 'isCorrect' must be true, and 'feedback' should be a short, congratulatory message like \"Well done, Yodha! Your logic is sharp as a warrior's sword.\"\n- If the code is incorrect, 'isCorrect' must be false, and 'feedback' should be a kind, encouraging message explaining the mistake in simple terms. Avoid giving the direct answer. For example, \"A noble attempt, young warrior. It seems you have forgotten the correct way to...\"".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO
/// error, returns None and the caller falls back to defaults.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "guru_backend", %path, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "guru_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "guru_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tutorial::{StepGate, TutorialAction};

  #[test]
  fn default_policy_reveals_after_three() {
    assert_eq!(Policy::default().example_refresh_limit, 3);
  }

  #[test]
  fn default_templates_carry_their_placeholders() {
    let p = Prompts::default();
    assert!(p.lesson_user_template.contains("{mission_number}"));
    assert!(p.lesson_user_template.contains("{topic}"));
    assert!(p.refresh_user_template.contains("{old_example}"));
    assert!(p.eval_user_template.contains("{user_code}"));
    assert!(p.eval_user_template.contains("{solution}"));
    assert!(p.eval_user_template.contains("{challenge}"));
  }

  #[test]
  fn full_config_parses_from_toml() {
    let cfg: AgentConfig = toml::from_str(
      r#"
        missions = ["Variables", "Loops"]

        [policy]
        example_refresh_limit = 5

        [prompts]
        lesson_system = "sys"
        lesson_user_template = "u {topic} {mission_number}"
        refresh_system = "sys"
        refresh_user_template = "u {topic} {old_example}"
        eval_system = "sys"
        eval_user_template = "u {challenge} {solution} {user_code}"

        [[tutorial]]
        anchor = "editor"
        text = "type it"
        placement = "top"
        gate = { code = "x = 1" }

        [[tutorial]]
        anchor = "next-button"
        text = "onwards"
        placement = "top"
        gate = { action = "next" }
        final_step = true
      "#,
    )
    .unwrap();

    assert_eq!(cfg.missions.len(), 2);
    assert_eq!(cfg.policy.example_refresh_limit, 5);
    assert_eq!(cfg.tutorial.len(), 2);
    assert_eq!(cfg.tutorial[0].gate, Some(StepGate::Code("x = 1".into())));
    assert_eq!(cfg.tutorial[1].gate, Some(StepGate::Action(TutorialAction::Next)));
    assert!(cfg.tutorial[1].final_step);
  }

  #[test]
  fn empty_config_uses_defaults() {
    let cfg: AgentConfig = toml::from_str("").unwrap();
    assert!(cfg.missions.is_empty());
    assert!(cfg.tutorial.is_empty());
    assert_eq!(cfg.policy.example_refresh_limit, 3);
    assert!(cfg.prompts.lesson_system.contains("Guru"));
  }
}
