//! Model gateway for the three lesson-flow calls.
//!
//! We only use chat.completions with a strict JSON object response. Each
//! operation is a single attempt: no retries, no caching; a failure surfaces
//! to the caller, who decides what the session sees.
//! Calls are instrumented and log model names, latencies, and response sizes
//! (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{EvaluationVerdict, Lesson};
use crate::error::{GuruError, Result};
use crate::util::{fill_template, trunc_for_log};

const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

/// Narrow payload for the alternate-example call.
#[derive(Deserialize)]
struct ExampleOnly {
  example: String,
}

impl OpenAI {
  /// Construct the client. The API key is mandatory: without it the
  /// application must refuse to start rather than fail on first use.
  pub fn from_env() -> Result<Self> {
    let api_key =
      std::env::var(API_KEY_VAR).map_err(|_| GuruError::MissingApiKey { var: API_KEY_VAR })?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    // Lesson payloads carry seven long fields; give the call room to finish.
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| GuruError::service(format!("HTTP client init: {e}")))?;

    Ok(Self { client, api_key, base_url, fast_model, strong_model })
  }

  /// JSON-object chat completion returning the raw content text.
  /// Transport and HTTP-status failures become `Service` errors.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json_text(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<String> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "guru-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| GuruError::service(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(GuruError::service(format!("HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse =
      res.json().await.map_err(|e| GuruError::service(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "model usage");
    }
    let text = body.choices.get(0)
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default();

    Ok(text)
  }

  // --- High-level operations ---

  /// Generate the full lesson for a mission. The payload must carry all
  /// seven fields; anything less is a format error, not a partial lesson.
  #[instrument(
    level = "info",
    skip(self, prompts, topic),
    fields(model = %self.strong_model)
  )]
  pub async fn generate_lesson(
    &self,
    prompts: &Prompts,
    mission_index: usize,
    topic: &str,
  ) -> Result<Lesson> {
    let mission_number = (mission_index + 1).to_string();
    let user = fill_template(
      &prompts.lesson_user_template,
      &[("mission_number", mission_number.as_str()), ("topic", topic)],
    );

    let start = std::time::Instant::now();
    let result = self
      .chat_json_text(&self.strong_model, &prompts.lesson_system, &user, 0.9)
      .await;
    let elapsed = start.elapsed();

    let text = match result {
      Ok(t) => {
        info!(?elapsed, bytes = t.len(), "lesson text received");
        t
      }
      Err(e) => {
        error!(?elapsed, error = %e, kind = e.kind(), "lesson generation failed");
        return Err(e);
      }
    };

    parse_json_payload::<Lesson>(&text)
  }

  /// Generate a simpler replacement for a confusing example. The previous
  /// example rides along so the model produces something different.
  #[instrument(level = "info", skip(self, prompts, topic, old_example), fields(model = %self.fast_model, old_len = old_example.len()))]
  pub async fn generate_alternate_example(
    &self,
    prompts: &Prompts,
    topic: &str,
    old_example: &str,
  ) -> Result<String> {
    let user = fill_template(
      &prompts.refresh_user_template,
      &[("topic", topic), ("old_example", old_example)],
    );
    let text = self
      .chat_json_text(&self.fast_model, &prompts.refresh_system, &user, 0.9)
      .await?;
    Ok(parse_json_payload::<ExampleOnly>(&text)?.example)
  }

  /// Judge a submission against the reference solution for the stated
  /// challenge. Feedback for a miss must not hand over the exact fix.
  #[instrument(level = "info", skip(self, prompts, user_code, solution, challenge),
               fields(model = %self.strong_model, code_len = user_code.len()))]
  pub async fn evaluate_submission(
    &self,
    prompts: &Prompts,
    user_code: &str,
    solution: &str,
    challenge: &str,
  ) -> Result<EvaluationVerdict> {
    let user = fill_template(
      &prompts.eval_user_template,
      &[("challenge", challenge), ("solution", solution), ("user_code", user_code)],
    );
    let text = self
      .chat_json_text(&self.strong_model, &prompts.eval_system, &user, 0.2)
      .await?;
    parse_json_payload::<EvaluationVerdict>(&text)
  }
}

/// Models sometimes wrap the JSON object in markdown code fences despite
/// the response-format constraint. Strip them before parsing.
fn strip_code_fences(s: &str) -> String {
  s.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse the model's text as `T` after fence stripping. Invalid JSON and
/// missing required fields both land here as `ResponseFormat`.
fn parse_json_payload<T: for<'a> Deserialize<'a>>(text: &str) -> Result<T> {
  let cleaned = strip_code_fences(text);
  serde_json::from_str::<T>(&cleaned).map_err(|e| {
    error!(payload = %trunc_for_log(&cleaned, 120), error = %e, "response violates JSON contract");
    GuruError::response_format(e.to_string())
  })
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from the API's error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
