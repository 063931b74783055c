//! Interview session orchestration
//!
//! This module provides the `SessionController` state machine and the types it
//! works with:
//! - topics, messages and evaluations
//! - the append-only `MessageLog` of the active session
//! - the shared `InputBuffer` that typed and dictated text lands in

mod controller;
mod error;
mod input;
mod log;
mod types;

pub use controller::{
    fallback_evaluation, SessionController, EXPLANATION_FALLBACK, QUESTION_FALLBACK,
    SYSTEM_ERROR_POINT,
};
pub use error::{InterviewError, InterviewResult};
pub use input::InputBuffer;
pub use log::MessageLog;
pub use types::{EvaluationResult, Message, MessageKind, Phase, Sender, Topic, WELCOME_MESSAGE_ID};
