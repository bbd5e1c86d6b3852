//! Application state: the session store, the model gateway, prompts, the
//! mission catalog, the tutorial script, and gameplay policy.
//!
//! Sessions live behind their own async mutex: one transition (including
//! its awaited gateway call) finishes before the next one for that session
//! begins. The outer map lock is only held for lookups and inserts.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{load_agent_config_from_env, Policy, Prompts};
use crate::error::Result;
use crate::missions::{mission_topics, tutorial_script};
use crate::openai::OpenAI;
use crate::session::GameSession;
use crate::tutorial::TutorialStep;

pub type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, SharedSession>>>,
    pub openai: OpenAI,
    pub prompts: Prompts,
    pub missions: Arc<Vec<String>>,
    pub tutorial: Arc<Vec<TutorialStep>>,
    pub policy: Policy,
}

impl AppState {
    /// Build state from env: load config, resolve catalog and script,
    /// construct the gateway. Fails when the API key is absent; the
    /// application must not start without it.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Result<Self> {
        let cfg = load_agent_config_from_env().unwrap_or_default();

        let prompts = cfg.prompts;
        let missions = if cfg.missions.is_empty() { mission_topics() } else { cfg.missions };
        let tutorial = if cfg.tutorial.is_empty() { tutorial_script() } else { cfg.tutorial };
        let policy = cfg.policy;

        let openai = OpenAI::from_env()?;
        info!(
            target: "guru_backend",
            base_url = %openai.base_url,
            fast_model = %openai.fast_model,
            strong_model = %openai.strong_model,
            missions = missions.len(),
            tutorial_steps = tutorial.len(),
            refresh_limit = policy.example_refresh_limit,
            "Gateway ready"
        );

        Ok(Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            openai,
            prompts,
            missions: Arc::new(missions),
            tutorial: Arc::new(tutorial),
            policy,
        })
    }

    /// Create and register a fresh session at the welcome screen.
    #[instrument(level = "info", skip(self))]
    pub async fn create_session(&self) -> SharedSession {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(GameSession::new(id.clone())));
        self.sessions.write().await.insert(id.clone(), session.clone());
        info!(target: "mission", %id, "Session created");
        session
    }

    pub async fn get_session(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session (WS disconnect). Progress is session-scoped and not
    /// persisted across restarts, so this is a plain forget.
    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: &str) {
        self.sessions.write().await.remove(id);
        info!(target: "mission", %id, "Session dropped");
    }

    pub fn topic_for(&self, mission_index: usize) -> Option<String> {
        self.missions.get(mission_index).cloned()
    }
}
