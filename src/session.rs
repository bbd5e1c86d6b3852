//! Per-learner game session: the lesson/game state machine, the console
//! transcript, the example-refresh counter, and the tutorial wiring.
//!
//! Transitions here are synchronous and never touch the network. The async
//! half lives in `logic.rs`: it calls `begin_*`, awaits the gateway, then
//! feeds the outcome back through `apply_*`/`fail_*`. That split keeps the
//! machine testable without a model in the loop, and it means exactly one
//! suspend-resume cycle is in flight per boundary: the phase guards (and the
//! refresh flag) reject overlapping triggers instead of queueing them.

use tracing::instrument;

use crate::domain::{EvaluationVerdict, GamePhase, Lesson, TranscriptEntry};
use crate::tutorial::{Sequencer, TutorialAction, TutorialEvent, TutorialStep};

const MSG_WELCOME: &str = "Welcome, Yodha, to a world of code!";
const MSG_LOAD_ERROR: &str =
    "Error: The ancient scrolls are unreadable. Please check your connection and refresh.";
const MSG_SUBMITTING: &str = "> Presenting your code to the Guru for evaluation...";
const MSG_EVAL_ERROR: &str = "Error: The Guru could not evaluate your code. Please try again.";
const MSG_GAME_OVER: &str =
    "Congratulations, Yodha! You have mastered the art of code and brought wisdom to the land!";
const MSG_REVEAL: &str =
    "You have sought guidance thrice. The Guru will now guide your hand. Watch the editor!";
const MSG_REFRESHING: &str = "The Guru is creating a new teaching scroll...";
const MSG_NEW_SCROLL: &str = "A new scroll has appeared!";
const MSG_REFRESH_ERROR: &str = "Error: The Guru is deep in meditation. Please try again later.";
const MSG_SOLUTION_COPIED: &str = "> The Guru's correct code has been copied to your editor!";
const MSG_TUTORIAL_SKIPPED: &str = "Tutorial skipped. You are on your own, Yodha!";

/// What `next_mission` decided.
#[derive(Debug, PartialEq, Eq)]
pub enum NextOutcome {
    /// The mission index advanced; the caller should load it.
    LoadNext,
    /// The catalog is exhausted; the session is over.
    Finished,
}

/// What `begin_example_refresh` decided.
#[derive(Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Threshold reached: the full solution reveal is pending, no model call.
    Reveal,
    /// Below threshold: the caller should fetch an alternate example.
    Generate,
}

/// All mutable state owned by one learner's session. Mutations are
/// serialized by the caller (one transition at a time).
#[derive(Debug)]
pub struct GameSession {
    pub id: String,
    pub phase: GamePhase,
    pub mission_index: usize,
    pub lesson: Option<Lesson>,
    pub user_code: String,
    pub transcript: Vec<TranscriptEntry>,
    pub example_refreshes: u32,
    pub refresh_in_flight: bool,
    pub animated_solution: Option<String>,
    pub tutorial: Sequencer,
}

impl GameSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phase: GamePhase::Welcome,
            mission_index: 0,
            lesson: None,
            user_code: String::new(),
            transcript: vec![TranscriptEntry::narration(MSG_WELCOME)],
            example_refreshes: 0,
            refresh_in_flight: false,
            animated_solution: None,
            tutorial: Sequencer::new(),
        }
    }

    fn narrate(&mut self, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::narration(text));
    }

    /// Enter LoadingLevel for the current mission index. The transcript is
    /// REPLACED with a single loading entry: a deliberate reset point. The
    /// refresh counter and any pending reveal are cleared with it.
    #[instrument(level = "debug", skip(self, topic), fields(id = %self.id, mission = self.mission_index))]
    pub fn begin_mission_load(&mut self, topic: &str) -> Result<(), String> {
        match self.phase {
            GamePhase::Welcome | GamePhase::Success | GamePhase::Error => {}
            GamePhase::LoadingLevel | GamePhase::Evaluating => {
                return Err("a request is already in flight".into());
            }
            GamePhase::Lesson => return Err("mission already loaded".into()),
            GamePhase::GameOver => return Err("the journey is complete".into()),
        }
        self.phase = GamePhase::LoadingLevel;
        self.transcript = vec![TranscriptEntry::narration(format!(
            "Loading Mission {}: {}...",
            self.mission_index + 1,
            topic
        ))];
        self.example_refreshes = 0;
        self.refresh_in_flight = false;
        self.animated_solution = None;
        Ok(())
    }

    /// Lesson fetch succeeded: store it, clear the code buffer, reset the
    /// transcript to the "received" entry, and start the tutorial on the
    /// first mission (a no-op once completed).
    #[instrument(level = "debug", skip(self, lesson), fields(id = %self.id, mission = self.mission_index))]
    pub fn apply_lesson(&mut self, lesson: Lesson) {
        self.lesson = Some(lesson);
        self.user_code.clear();
        self.transcript = vec![TranscriptEntry::narration(format!(
            "Mission {} received! Read the Guru's teachings and begin your test.",
            self.mission_index + 1
        ))];
        self.phase = GamePhase::Lesson;
        if self.mission_index == 0 {
            self.tutorial.begin();
        }
    }

    /// Lesson fetch failed: Error phase, one appended error narration.
    /// Not auto-recovering; the learner must re-trigger the load.
    pub fn fail_mission_load(&mut self) {
        self.phase = GamePhase::Error;
        self.narrate(MSG_LOAD_ERROR);
    }

    /// Enter Evaluating. Allowed from Lesson, and from Error as the manual
    /// retry path after a failed evaluation.
    #[instrument(level = "debug", skip(self, script), fields(id = %self.id))]
    pub fn begin_run(&mut self, script: &[TutorialStep]) -> Result<(), String> {
        if self.lesson.is_none() {
            return Err("no mission loaded".into());
        }
        match self.phase {
            GamePhase::Lesson | GamePhase::Error => {}
            GamePhase::Evaluating | GamePhase::LoadingLevel => {
                return Err("a request is already in flight".into());
            }
            _ => return Err("nothing to run right now".into()),
        }
        self.tutorial
            .observe(script, &TutorialEvent::Action(TutorialAction::Run));
        self.phase = GamePhase::Evaluating;
        self.narrate(MSG_SUBMITTING);
        Ok(())
    }

    /// Consume the model's verdict. Correct submissions get a plain
    /// congratulatory narration; incorrect ones get the structured feedback
    /// record carrying both code versions, and the lesson continues.
    #[instrument(level = "debug", skip(self, script, verdict), fields(id = %self.id, correct = verdict.is_correct))]
    pub fn apply_verdict(&mut self, verdict: EvaluationVerdict, script: &[TutorialStep]) {
        let Some(solution) = self.lesson.as_ref().map(|l| l.solution.clone()) else {
            return;
        };
        if verdict.is_correct {
            self.transcript.push(TranscriptEntry::narration(verdict.feedback));
            self.phase = GamePhase::Success;
            self.tutorial
                .observe(script, &TutorialEvent::Action(TutorialAction::RunSuccess));
        } else {
            self.transcript.push(TranscriptEntry::Feedback {
                feedback: verdict.feedback,
                user_code: self.user_code.clone(),
                solution_code: solution,
            });
            self.phase = GamePhase::Lesson;
        }
    }

    /// Evaluation call failed: Error phase, one appended error narration.
    pub fn fail_evaluation(&mut self) {
        self.phase = GamePhase::Error;
        self.narrate(MSG_EVAL_ERROR);
    }

    /// Advance to the next mission or finish the game. While the tutorial
    /// is active, only its final "click next" step may pass.
    #[instrument(level = "debug", skip(self, script), fields(id = %self.id, mission = self.mission_index))]
    pub fn next_mission(
        &mut self,
        catalog_len: usize,
        script: &[TutorialStep],
    ) -> Result<NextOutcome, String> {
        if self.phase != GamePhase::Success {
            return Err("complete the current mission first".into());
        }
        if self.tutorial.next_mission_locked(script) {
            return Err("finish the tutorial step first".into());
        }
        self.tutorial
            .observe(script, &TutorialEvent::Action(TutorialAction::Next));
        if self.mission_index + 1 < catalog_len {
            self.mission_index += 1;
            Ok(NextOutcome::LoadNext)
        } else {
            self.phase = GamePhase::GameOver;
            self.narrate(MSG_GAME_OVER);
            Ok(NextOutcome::Finished)
        }
    }

    /// Side-channel: append the stored hint, if any. No phase change.
    pub fn hint(&mut self) -> Result<(), String> {
        if !matches!(self.phase, GamePhase::Lesson | GamePhase::Success) {
            return Err("no hint available right now".into());
        }
        if let Some(hint) = self.lesson.as_ref().map(|l| l.hint.clone()) {
            if !hint.is_empty() {
                self.narrate(format!("A whisper from the Guru: {}", hint));
            }
        }
        Ok(())
    }

    /// Count a refresh request. At the policy threshold the Guru gives up on
    /// alternatives and queues the full solution reveal instead, resetting
    /// the counter; below it the caller fetches an alternate example.
    #[instrument(level = "debug", skip(self), fields(id = %self.id, count = self.example_refreshes))]
    pub fn begin_example_refresh(&mut self, limit: u32) -> Result<RefreshOutcome, String> {
        let Some(lesson) = &self.lesson else {
            return Err("no mission loaded".into());
        };
        if self.refresh_in_flight {
            return Err("a new scroll is already being written".into());
        }
        if self.phase.is_busy() {
            return Err("a request is already in flight".into());
        }
        self.example_refreshes += 1;
        if self.example_refreshes >= limit {
            let solution = lesson.solution.clone();
            self.narrate(MSG_REVEAL);
            self.animated_solution = Some(solution);
            self.example_refreshes = 0;
            Ok(RefreshOutcome::Reveal)
        } else {
            self.refresh_in_flight = true;
            self.narrate(MSG_REFRESHING);
            Ok(RefreshOutcome::Generate)
        }
    }

    /// Alternate example arrived: swap it into the lesson in place.
    /// The other six lesson fields stay untouched.
    pub fn apply_example(&mut self, example: String) {
        if let Some(lesson) = &mut self.lesson {
            lesson.example = example;
        }
        self.narrate(MSG_NEW_SCROLL);
        self.refresh_in_flight = false;
    }

    /// Alternate-example call failed. The phase is untouched: a refresh
    /// failure narrates and releases the flag, nothing more.
    pub fn fail_example_refresh(&mut self) {
        self.narrate(MSG_REFRESH_ERROR);
        self.refresh_in_flight = false;
    }

    /// The client finished playing the solution reveal animation.
    pub fn animation_done(&mut self) {
        self.animated_solution = None;
    }

    /// Replace the code buffer and let the tutorial see the new snapshot.
    pub fn set_user_code(&mut self, code: String, script: &[TutorialStep]) {
        self.user_code = code;
        self.tutorial
            .observe(script, &TutorialEvent::CodeSnapshot(self.user_code.clone()));
    }

    /// Copy the reference solution from a feedback record into the editor.
    pub fn copy_solution_to_editor(&mut self, script: &[TutorialStep]) -> Result<(), String> {
        let Some(lesson) = &self.lesson else {
            return Err("no mission loaded".into());
        };
        let solution = lesson.solution.clone();
        self.narrate(MSG_SOLUTION_COPIED);
        self.set_user_code(solution, script);
        Ok(())
    }

    /// Explicit acknowledgment of an ungated tutorial step.
    pub fn tutorial_acknowledge(&mut self, script: &[TutorialStep]) -> bool {
        self.tutorial.acknowledge(script)
    }

    /// Abandon the tutorial; completion sticks for the session.
    pub fn skip_tutorial(&mut self) -> Result<(), String> {
        if !self.tutorial.is_active() {
            return Err("no tutorial in progress".into());
        }
        self.tutorial.skip();
        self.narrate(MSG_TUTORIAL_SKIPPED);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EvaluationVerdict;
    use crate::missions::{mission_topics, tutorial_script};

    fn lesson() -> Lesson {
        Lesson {
            title: "Variables: The Naming Ceremony".into(),
            story: "The scribe awaits.".into(),
            explanation: "A variable is a potli.".into(),
            example: "mangoes = 5  # five mangoes".into(),
            challenge: "Store 5 in mangoes and print it.".into(),
            solution: "mangoes = 5\nprint(mangoes)".into(),
            hint: "Use the = sign.".into(),
        }
    }

    fn session_in_lesson() -> (GameSession, Vec<TutorialStep>) {
        let script = tutorial_script();
        let mut s = GameSession::new("s1");
        s.begin_mission_load("Variables & Data Types: The Naming Ceremony").unwrap();
        s.apply_lesson(lesson());
        (s, script)
    }

    #[test]
    fn new_session_starts_at_welcome() {
        let s = GameSession::new("s1");
        assert_eq!(s.phase, GamePhase::Welcome);
        assert_eq!(s.transcript.len(), 1);
        assert!(!s.tutorial.is_active());
    }

    #[test]
    fn mission_load_resets_transcript_counter_and_reveal() {
        let (mut s, script) = session_in_lesson();
        s.animated_solution = Some("x".into());
        s.example_refreshes = 2;
        for i in 0..4 {
            s.narrate(format!("noise {i}"));
        }
        s.begin_run(&script).unwrap();
        s.apply_verdict(EvaluationVerdict { is_correct: true, feedback: "Well done!".into() }, &script);
        s.skip_tutorial().unwrap();

        s.next_mission(8, &script).unwrap();
        s.begin_mission_load("Working with Numbers").unwrap();
        assert_eq!(s.transcript.len(), 1);
        assert_eq!(s.example_refreshes, 0);
        assert!(s.animated_solution.is_none());

        s.apply_lesson(lesson());
        assert_eq!(s.transcript.len(), 1);
        assert!(s.user_code.is_empty());
        assert_eq!(s.phase, GamePhase::Lesson);
    }

    #[test]
    fn tutorial_starts_on_first_mission_only() {
        let script = tutorial_script();
        let mut s = GameSession::new("s1");
        s.begin_mission_load("Variables").unwrap();
        s.apply_lesson(lesson());
        assert!(s.tutorial.is_active());

        let mut s2 = GameSession::new("s2");
        s2.begin_mission_load("Variables").unwrap();
        s2.apply_lesson(lesson());
        s2.skip_tutorial().unwrap();
        // Walk forward and back to mission 0 territory: completion sticks.
        assert!(s2.tutorial.completed());
        s2.begin_run(&script).unwrap();
        s2.apply_verdict(EvaluationVerdict { is_correct: true, feedback: "ok".into() }, &script);
        assert!(!s2.tutorial.is_active());
    }

    #[test]
    fn correct_run_reaches_success_with_plain_narration() {
        let (mut s, script) = session_in_lesson();
        s.set_user_code("mangoes = 5\nprint(mangoes)".into(), &script);
        s.begin_run(&script).unwrap();
        assert_eq!(s.phase, GamePhase::Evaluating);

        let before = s.transcript.len();
        s.apply_verdict(
            EvaluationVerdict { is_correct: true, feedback: "Well done, Yodha!".into() },
            &script,
        );
        assert_eq!(s.phase, GamePhase::Success);
        assert_eq!(
            s.transcript[before],
            TranscriptEntry::narration("Well done, Yodha!")
        );
    }

    #[test]
    fn incorrect_run_returns_to_lesson_with_feedback_record() {
        let (mut s, script) = session_in_lesson();
        s.set_user_code("mangoes = 6".into(), &script);
        s.begin_run(&script).unwrap();
        s.apply_verdict(
            EvaluationVerdict { is_correct: false, feedback: "A noble attempt.".into() },
            &script,
        );
        assert_eq!(s.phase, GamePhase::Lesson);
        match s.transcript.last().unwrap() {
            TranscriptEntry::Feedback { feedback, user_code, solution_code } => {
                assert_eq!(feedback, "A noble attempt.");
                assert_eq!(user_code, "mangoes = 6");
                assert_eq!(solution_code, "mangoes = 5\nprint(mangoes)");
            }
            other => panic!("expected feedback record, got {other:?}"),
        }
    }

    #[test]
    fn evaluation_failure_enters_error_and_allows_retry() {
        let (mut s, script) = session_in_lesson();
        s.begin_run(&script).unwrap();
        let before = s.transcript.len();
        s.fail_evaluation();
        assert_eq!(s.phase, GamePhase::Error);
        assert_eq!(s.transcript.len(), before + 1);

        // Manual retry from Error.
        s.begin_run(&script).unwrap();
        assert_eq!(s.phase, GamePhase::Evaluating);
    }

    #[test]
    fn load_failure_appends_exactly_one_error_narration() {
        let mut s = GameSession::new("s1");
        s.begin_mission_load("Variables & Data Types").unwrap();
        assert_eq!(s.transcript.len(), 1);
        s.fail_mission_load();
        assert_eq!(s.phase, GamePhase::Error);
        assert_eq!(s.transcript.len(), 2);

        // Retrying the load is allowed from Error.
        assert!(s.begin_mission_load("Variables & Data Types").is_ok());
    }

    #[test]
    fn busy_phases_reject_other_triggers() {
        let (mut s, script) = session_in_lesson();
        s.begin_run(&script).unwrap();
        assert!(s.begin_run(&script).is_err());
        assert!(s.begin_mission_load("Numbers").is_err());
        assert!(s.begin_example_refresh(3).is_err());
        assert!(s.hint().is_err());
    }

    #[test]
    fn refresh_reveals_on_third_request_and_resets() {
        let (mut s, _script) = session_in_lesson();
        assert_eq!(s.begin_example_refresh(3).unwrap(), RefreshOutcome::Generate);
        s.apply_example("x = 1  # simpler".into());
        assert_eq!(s.begin_example_refresh(3).unwrap(), RefreshOutcome::Generate);
        s.fail_example_refresh();
        assert_eq!(s.phase, GamePhase::Lesson);

        assert_eq!(s.begin_example_refresh(3).unwrap(), RefreshOutcome::Reveal);
        assert_eq!(s.animated_solution.as_deref(), Some("mangoes = 5\nprint(mangoes)"));
        assert_eq!(s.example_refreshes, 0);

        s.animation_done();
        assert!(s.animated_solution.is_none());
    }

    #[test]
    fn refresh_in_flight_is_single_slot() {
        let (mut s, _script) = session_in_lesson();
        s.begin_example_refresh(3).unwrap();
        assert!(s.begin_example_refresh(3).is_err());
        s.apply_example("y = 2  # two".into());
        assert_eq!(s.lesson.as_ref().unwrap().example, "y = 2  # two");
        // Other lesson fields untouched by the in-place swap.
        assert_eq!(s.lesson.as_ref().unwrap().solution, "mangoes = 5\nprint(mangoes)");
    }

    #[test]
    fn final_mission_next_finishes_the_game() {
        let (mut s, script) = session_in_lesson();
        s.skip_tutorial().unwrap();
        s.mission_index = mission_topics().len() - 1;
        s.begin_run(&script).unwrap();
        s.apply_verdict(EvaluationVerdict { is_correct: true, feedback: "done".into() }, &script);

        let before = s.transcript.len();
        assert_eq!(s.next_mission(mission_topics().len(), &script).unwrap(), NextOutcome::Finished);
        assert_eq!(s.phase, GamePhase::GameOver);
        assert_eq!(s.transcript.len(), before + 1);
        // Terminal: nothing further may load.
        assert!(s.begin_mission_load("anything").is_err());
    }

    #[test]
    fn tutorial_locks_next_until_its_final_step() {
        let (mut s, script) = session_in_lesson();
        assert!(s.tutorial.is_active());
        s.begin_run(&script).unwrap();
        s.apply_verdict(EvaluationVerdict { is_correct: true, feedback: "ok".into() }, &script);
        // Still on an early reading step: next is held back.
        assert!(s.next_mission(8, &script).is_err());
        assert_eq!(s.phase, GamePhase::Success);
    }

    #[test]
    fn tutorial_walkthrough_completes_via_gates() {
        let (mut s, script) = session_in_lesson();
        // Reading steps 0-4.
        for _ in 0..5 {
            assert!(s.tutorial_acknowledge(&script));
        }
        // Typed-code gates.
        s.set_user_code("mangoes=5".into(), &script);
        assert_eq!(s.tutorial.step_index(), Some(6));
        s.set_user_code("mangoes = 5\n print(mangoes)".into(), &script);
        assert_eq!(s.tutorial.step_index(), Some(7));
        // Run-success gate.
        s.begin_run(&script).unwrap();
        s.apply_verdict(EvaluationVerdict { is_correct: true, feedback: "ok".into() }, &script);
        assert_eq!(s.tutorial.step_index(), Some(8));
        // Final step waits for next; next is unlocked now.
        s.next_mission(8, &script).unwrap();
        assert!(s.tutorial.completed());
        assert!(!s.tutorial.is_active());
    }

    #[test]
    fn hint_appends_in_lesson_and_success() {
        let (mut s, script) = session_in_lesson();
        let before = s.transcript.len();
        s.hint().unwrap();
        assert_eq!(
            s.transcript[before],
            TranscriptEntry::narration("A whisper from the Guru: Use the = sign.")
        );

        s.begin_run(&script).unwrap();
        s.apply_verdict(EvaluationVerdict { is_correct: true, feedback: "ok".into() }, &script);
        assert!(s.hint().is_ok());
    }

    #[test]
    fn solution_copy_fills_editor_and_narrates() {
        let (mut s, script) = session_in_lesson();
        s.skip_tutorial().unwrap();
        s.copy_solution_to_editor(&script).unwrap();
        assert_eq!(s.user_code, "mangoes = 5\nprint(mangoes)");
        assert_eq!(
            s.transcript.last().unwrap(),
            &TranscriptEntry::narration(MSG_SOLUTION_COPIED)
        );
    }
}
