use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// A single transcript segment from the STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Transcribed text
    pub text: String,

    /// When this segment was received
    pub timestamp: DateTime<Utc>,

    /// Confidence score (0.0 to 1.0), if available
    pub confidence: Option<f32>,

    /// Whether this is a partial (interim) result
    pub partial: bool,
}

impl TranscriptSegment {
    pub fn is_final(&self) -> bool {
        !self.partial
    }
}

/// Errors reported by an open recognition stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("no speech detected")]
    NoSpeech,

    #[error("network error: {0}")]
    Network(String),

    #[error("recognition engine error: {0}")]
    Engine(String),
}

impl RecognitionError {
    /// Benign errors leave listening untouched
    pub fn is_benign(&self) -> bool {
        matches!(self, RecognitionError::NoSpeech)
    }
}

/// What an open recognition stream delivers
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A batch of interim and final segments
    Results(Vec<TranscriptSegment>),
    Error(RecognitionError),
    /// The stream is over; always the last event
    End,
}

/// Continuous speech-to-text capability
///
/// Implementations:
/// - NATS: forwards to an external STT service
/// - tests: scripted engines
#[async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Open a continuous, interim-enabled stream in `locale`
    ///
    /// The stream ends on its own after a stretch of silence.
    async fn open(&self, locale: &str) -> Result<mpsc::Receiver<StreamEvent>>;

    /// Ask the open stream to end. It still delivers `StreamEvent::End`.
    async fn close(&self) -> Result<()>;

    /// Get engine name for logging
    fn name(&self) -> &str;
}
