use async_trait::async_trait;
use thiserror::Error;

use crate::interview::{EvaluationResult, Topic};

/// Failures talking to the generation service
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("generation endpoint is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("service returned an empty response")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Question, evaluation and explanation requests
///
/// Request/response only; the session controller owns fallbacks.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_question(&self, topic: Topic) -> Result<String, GenerationError>;

    async fn evaluate_answer(
        &self,
        topic: Topic,
        question: &str,
        answer: &str,
    ) -> Result<EvaluationResult, GenerationError>;

    async fn explain_concept(
        &self,
        topic: Topic,
        question: &str,
        follow_up: &str,
    ) -> Result<String, GenerationError>;
}
