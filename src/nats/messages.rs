use serde::{Deserialize, Serialize};

/// Asks the STT service to open a continuous recognition stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionRequest {
    pub session_id: String,
    pub locale: String,
    /// Publish partial hypotheses as well as final results
    pub interim_results: bool,
    pub continuous: bool,
}

/// Asks the STT service to close a recognition stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionStop {
    pub session_id: String,
}

/// Transcript message received from STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}
