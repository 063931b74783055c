use thiserror::Error;

use super::types::Phase;

/// Result type for controller operations
pub type InterviewResult<T> = Result<T, InterviewError>;

/// Rejections from the session controller.
///
/// Generation failures never show up here; they are replaced by fallback
/// content inside the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterviewError {
    #[error("a request is already in flight ({0})")]
    Busy(Phase),

    #[error("next question is only available after an evaluation (currently {0})")]
    NotReviewing(Phase),

    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("history session not found: {0}")]
    SessionNotFound(String),
}
