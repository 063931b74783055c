use super::state::AppState;
use crate::history::HistorySession;
use crate::interview::{InterviewError, Message, Phase, SessionController, Topic};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    /// Topic id, e.g. "JAVA_CORE"
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitInputRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TopicInfo {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PhaseResponse {
    pub phase: Phase,
    pub in_flight: bool,
}

/// Current state of the interview
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSnapshot {
    pub session_id: Option<String>,
    pub topic: Topic,
    pub phase: Phase,
    pub current_question: Option<String>,
    pub messages: Vec<Message>,
}

impl InterviewSnapshot {
    pub fn from_controller(controller: &SessionController) -> Self {
        Self {
            session_id: controller.session_id().map(str::to_string),
            topic: controller.topic(),
            phase: controller.phase(),
            current_question: controller.current_question().map(str::to_string),
            messages: controller.messages().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn interview_error_response(err: InterviewError) -> Response {
    let status = match err {
        InterviewError::Busy(_) => StatusCode::CONFLICT,
        InterviewError::NotReviewing(_) | InterviewError::UnknownTopic(_) => {
            StatusCode::BAD_REQUEST
        }
        InterviewError::SessionNotFound(_) => StatusCode::NOT_FOUND,
    };
    error_response(status, err.to_string())
}

/// Run `op` against the controller in its own task.
///
/// A second mutating request while one is running gets `409` instead of
/// queueing behind it. A client hanging up cannot cancel the operation
/// halfway through a generation call.
async fn with_controller<T, F>(state: &AppState, op: F) -> Result<(T, InterviewSnapshot), Response>
where
    T: Send + 'static,
    F: for<'a> FnOnce(&'a mut SessionController) -> BoxFuture<'a, T> + Send + 'static,
{
    let operation = Arc::clone(&state.operation).try_lock_owned().map_err(|_| {
        let phase = *state.phase.borrow();
        warn!("Rejecting request, another operation is running ({})", phase);
        interview_error_response(InterviewError::Busy(phase))
    })?;
    let controller = Arc::clone(&state.controller);

    tokio::spawn(async move {
        let _operation = operation;
        let mut guard = controller.lock_owned().await;
        let out = op(&mut guard).await;
        (out, InterviewSnapshot::from_controller(&guard))
    })
    .await
    .map_err(|e| {
        error!("Interview task failed: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "interview task failed")
    })
}

fn snapshot_or_error(
    result: Result<(Result<(), InterviewError>, InterviewSnapshot), Response>,
) -> Response {
    match result {
        Ok((Ok(()), snapshot)) => (StatusCode::OK, Json(snapshot)).into_response(),
        Ok((Err(e), _)) => interview_error_response(e),
        Err(resp) => resp,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /topics
pub async fn list_topics() -> impl IntoResponse {
    let topics: Vec<TopicInfo> = Topic::ALL
        .iter()
        .map(|t| TopicInfo {
            id: t.id(),
            label: t.label(),
        })
        .collect();
    Json(topics)
}

/// POST /interview/start
/// Start a new session on a topic
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> Response {
    let topic: Topic = match req.topic.parse() {
        Ok(t) => t,
        Err(e) => return interview_error_response(e),
    };

    info!("Starting interview on {}", topic.id());

    let result = with_controller(&state, move |c| c.select_topic(topic).boxed()).await;
    snapshot_or_error(result)
}

/// POST /interview/input
/// Submit an answer or a follow-up question
pub async fn submit_input(
    State(state): State<AppState>,
    Json(req): Json<SubmitInputRequest>,
) -> Response {
    let result = with_controller(&state, move |c| {
        async move { c.submit_input(&req.text).await.map(|_| ()) }.boxed()
    })
    .await;
    snapshot_or_error(result)
}

/// POST /interview/next
pub async fn next_question(State(state): State<AppState>) -> Response {
    let result = with_controller(&state, |c| c.advance_to_next_question().boxed()).await;
    snapshot_or_error(result)
}

/// GET /interview
pub async fn get_interview(State(state): State<AppState>) -> impl IntoResponse {
    let controller = state.controller.lock().await;
    Json(InterviewSnapshot::from_controller(&controller))
}

/// GET /interview/phase
/// Answers without waiting for an in-flight request
pub async fn get_phase(State(state): State<AppState>) -> impl IntoResponse {
    let phase = *state.phase.borrow();
    Json(PhaseResponse {
        phase,
        in_flight: phase.is_in_flight(),
    })
}

/// GET /history
pub async fn list_history(State(state): State<AppState>) -> impl IntoResponse {
    let controller = state.controller.lock().await;
    let sessions: Vec<HistorySession> = controller.history().sessions().to_vec();
    Json(sessions)
}

/// POST /history/:session_id/load
/// Resume a stored session
pub async fn load_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    info!("Loading history session {}", session_id);

    let result = with_controller(&state, move |c| {
        futures::future::ready(c.load_history_by_id(&session_id)).boxed()
    })
    .await;
    snapshot_or_error(result)
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
