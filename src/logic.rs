//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Each function drives one user action end to end: guard the transition on
//! the session, await the gateway where the action needs the model, then
//! feed the outcome back into the session. Gateway errors never escape this
//! module; they become the session's themed error narration, and service
//! and format failures read the same to the learner.
//!
//! `Err(String)` from these functions means the trigger was rejected by a
//! guard (wrong phase, request in flight); callers surface it verbatim.

use tracing::{error, info, instrument};

use crate::session::{GameSession, NextOutcome, RefreshOutcome};
use crate::state::AppState;

/// Load the session's current mission index from the model. Shared by
/// start, next-mission, and the manual retry after a failed load.
#[instrument(level = "info", skip(state, s), fields(id = %s.id, mission = s.mission_index))]
pub async fn load_current_mission(state: &AppState, s: &mut GameSession) -> Result<(), String> {
  let Some(topic) = state.topic_for(s.mission_index) else {
    return Err("mission catalog exhausted".into());
  };
  s.begin_mission_load(&topic)?;

  match state.openai.generate_lesson(&state.prompts, s.mission_index, &topic).await {
    Ok(lesson) => {
      info!(target: "mission", id = %s.id, mission = s.mission_index, title = %lesson.title, "Mission loaded");
      s.apply_lesson(lesson);
    }
    Err(e) => {
      error!(target: "mission", id = %s.id, mission = s.mission_index, error = %e, kind = e.kind(), "Mission load failed");
      s.fail_mission_load();
    }
  }
  Ok(())
}

/// The welcome-screen start button (and the retry path from Error).
#[instrument(level = "info", skip(state, s), fields(id = %s.id))]
pub async fn start_game(state: &AppState, s: &mut GameSession) -> Result<(), String> {
  load_current_mission(state, s).await
}

/// Submit the code buffer for evaluation.
#[instrument(level = "info", skip(state, s), fields(id = %s.id, code_len = s.user_code.len()))]
pub async fn run_code(state: &AppState, s: &mut GameSession) -> Result<(), String> {
  s.begin_run(&state.tutorial)?;

  // begin_run guarantees the lesson is present.
  let (code, solution, challenge) = {
    let lesson = s.lesson.as_ref().ok_or_else(|| "no mission loaded".to_string())?;
    (s.user_code.clone(), lesson.solution.clone(), lesson.challenge.clone())
  };

  match state.openai.evaluate_submission(&state.prompts, &code, &solution, &challenge).await {
    Ok(verdict) => {
      info!(target: "mission", id = %s.id, correct = verdict.is_correct, "Submission evaluated");
      s.apply_verdict(verdict, &state.tutorial);
    }
    Err(e) => {
      error!(target: "mission", id = %s.id, error = %e, kind = e.kind(), "Evaluation failed");
      s.fail_evaluation();
    }
  }
  Ok(())
}

/// Advance past a success: load the next mission or close out the game.
#[instrument(level = "info", skip(state, s), fields(id = %s.id, mission = s.mission_index))]
pub async fn next_mission(state: &AppState, s: &mut GameSession) -> Result<(), String> {
  match s.next_mission(state.missions.len(), &state.tutorial)? {
    NextOutcome::LoadNext => load_current_mission(state, s).await,
    NextOutcome::Finished => {
      info!(target: "mission", id = %s.id, "Catalog exhausted; game over");
      Ok(())
    }
  }
}

/// Ask for a different example. Below the policy threshold this is a model
/// call; at the threshold it queues the full-solution reveal instead.
#[instrument(level = "info", skip(state, s), fields(id = %s.id, count = s.example_refreshes))]
pub async fn refresh_example(state: &AppState, s: &mut GameSession) -> Result<(), String> {
  match s.begin_example_refresh(state.policy.example_refresh_limit)? {
    RefreshOutcome::Reveal => {
      info!(target: "mission", id = %s.id, "Refresh limit reached; revealing solution");
      Ok(())
    }
    RefreshOutcome::Generate => {
      let Some(topic) = state.topic_for(s.mission_index) else {
        s.fail_example_refresh();
        return Ok(());
      };
      // begin_example_refresh guarantees the lesson is present.
      let old_example = s.lesson.as_ref().map(|l| l.example.clone()).unwrap_or_default();

      match state.openai.generate_alternate_example(&state.prompts, &topic, &old_example).await {
        Ok(example) => {
          info!(target: "mission", id = %s.id, "Alternate example applied");
          s.apply_example(example);
        }
        Err(e) => {
          error!(target: "mission", id = %s.id, error = %e, kind = e.kind(), "Alternate example failed");
          s.fail_example_refresh();
        }
      }
      Ok(())
    }
  }
}

/// Append the lesson hint, when the phase allows one.
pub fn hint(s: &mut GameSession) -> Result<(), String> {
  s.hint()
}

/// New code buffer snapshot from the editor.
pub fn set_code(state: &AppState, s: &mut GameSession, code: String) {
  s.set_user_code(code, &state.tutorial);
}

/// Copy the reference solution from feedback into the editor.
pub fn solution_to_editor(state: &AppState, s: &mut GameSession) -> Result<(), String> {
  s.copy_solution_to_editor(&state.tutorial)
}

/// The client finished the reveal animation.
pub fn animation_done(s: &mut GameSession) {
  s.animation_done();
}

/// Acknowledge the current (ungated) tutorial step.
pub fn tutorial_next(state: &AppState, s: &mut GameSession) -> Result<(), String> {
  if s.tutorial_acknowledge(&state.tutorial) {
    Ok(())
  } else {
    Err("this step advances on its own".into())
  }
}

/// Skip the tutorial for good.
pub fn tutorial_skip(s: &mut GameSession) -> Result<(), String> {
  s.skip_tutorial()
}
