//! HTTP API for external front ends
//!
//! This module exposes the interview controller over REST:
//! - GET /topics - Available interview topics
//! - POST /interview/start - Start a session on a topic
//! - POST /interview/input - Submit an answer or follow-up
//! - POST /interview/next - Move on to the next question
//! - GET /interview - Current session snapshot
//! - GET /interview/phase - Current phase, also while a request is in flight
//! - GET /history - Stored sessions
//! - POST /history/:id/load - Resume a stored session
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use handlers::InterviewSnapshot;
pub use routes::create_router;
pub use state::AppState;
