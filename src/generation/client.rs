use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::prompts::{evaluation_prompt, explanation_prompt, question_prompt};
use super::service::{GenerationError, GenerationService};
use crate::interview::{EvaluationResult, Topic};

const SYSTEM_PROMPT: &str = "You are an experienced technical interviewer for senior backend engineers.";

const QUESTION_TEMPERATURE: f32 = 0.9;
const EVALUATION_TEMPERATURE: f32 = 0.3;
const EXPLANATION_TEMPERATURE: f32 = 0.7;

/// Connection settings for the completion endpoint
#[derive(Debug, Clone)]
pub struct GenerationClientConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Language the service should answer in
    pub language: String,
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvaluation {
    score: Value,
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    missing_points: Vec<String>,
    #[serde(default)]
    ideal_answer: String,
}

// ── Client ────────────────────────────────────────────────────────────────────

/// HTTP client for the generation service.
///
/// Built once at startup and shared with the session controller.
pub struct GenerationClient {
    http: reqwest::Client,
    config: GenerationClientConfig,
}

impl GenerationClient {
    pub fn new(config: GenerationClientConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        info!(
            "Generation client ready: {} (model {})",
            config.endpoint, config.model
        );

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GenerationClientConfig {
        &self.config
    }

    async fn complete(
        &self,
        prompt: String,
        temperature: f32,
        json_output: bool,
    ) -> Result<String, GenerationError> {
        if self.config.endpoint.trim().is_empty() {
            return Err(GenerationError::NotConfigured);
        }

        let mut body = serde_json::json!({
            "model": self.config.model,
            "temperature": temperature,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        });
        if json_output {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let url = format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        let parsed: CompletionResponse = resp.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!("Completion received ({} chars)", text.len());
        Ok(text)
    }
}

#[async_trait]
impl GenerationService for GenerationClient {
    async fn generate_question(&self, topic: Topic) -> Result<String, GenerationError> {
        let prompt = question_prompt(topic, &self.config.language);
        self.complete(prompt, QUESTION_TEMPERATURE, false).await
    }

    async fn evaluate_answer(
        &self,
        topic: Topic,
        question: &str,
        answer: &str,
    ) -> Result<EvaluationResult, GenerationError> {
        let prompt = evaluation_prompt(topic, question, answer, &self.config.language);
        let raw = self.complete(prompt, EVALUATION_TEMPERATURE, true).await?;
        parse_evaluation(&raw)
    }

    async fn explain_concept(
        &self,
        topic: Topic,
        question: &str,
        follow_up: &str,
    ) -> Result<String, GenerationError> {
        let prompt = explanation_prompt(topic, question, follow_up, &self.config.language);
        self.complete(prompt, EXPLANATION_TEMPERATURE, false).await
    }
}

/// Parse an evaluation payload, tolerating a surrounding markdown code fence
pub fn parse_evaluation(raw: &str) -> Result<EvaluationResult, GenerationError> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let parsed: RawEvaluation = serde_json::from_str(cleaned)?;
    let score = match &parsed.score {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.round() as i64)
            .map_err(|_| GenerationError::Malformed(format!("score is not a number: {s}")))?,
        other => {
            return Err(GenerationError::Malformed(format!(
                "score is not a number: {other}"
            )))
        }
    };

    Ok(EvaluationResult::new(
        score,
        parsed.analysis,
        parsed.missing_points,
        parsed.ideal_answer,
    ))
}

fn strip_code_fence(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop the info string ("json") along with the opening fence line
        s = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    }
    s.trim().trim_end_matches("```").trim()
}
