use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::storage::HistoryStorage;
use crate::interview::{Message, Phase, Topic};

/// Longest preview kept before truncation
pub const PREVIEW_MAX_CHARS: usize = 60;

/// Preview used when no question text can be found
pub const UNRECORDED_PREVIEW: &str = "Unrecorded question";

/// One persisted interview session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySession {
    pub id: String,
    pub topic: Topic,
    /// Epoch millis, fixed when the record is first stored
    pub start_time: i64,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub preview: String,
    /// Controller phase at the time of the write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
}

/// Cut `text` to [`PREVIEW_MAX_CHARS`] characters, appending `...` when shortened
pub fn truncate_preview(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn derive_preview(incoming: &HistorySession, prior_preview: Option<&str>) -> String {
    if let Some(question) = incoming
        .current_question
        .as_deref()
        .filter(|q| !q.trim().is_empty())
    {
        return truncate_preview(question);
    }

    if let Some(prior) = prior_preview.filter(|p| !p.is_empty() && *p != UNRECORDED_PREVIEW) {
        return prior.to_string();
    }

    incoming
        .messages
        .iter()
        .find(|m| m.is_ai_text() && !m.is_welcome())
        .map(|m| truncate_preview(&m.content))
        .unwrap_or_else(|| UNRECORDED_PREVIEW.to_string())
}

/// Ordered collection of sessions mirrored to durable storage
pub struct HistoryStore {
    storage: Box<dyn HistoryStorage>,
    key: String,
    sessions: Vec<HistorySession>,
}

impl HistoryStore {
    /// Create a store over `storage` and load whatever it already holds
    pub fn open(storage: Box<dyn HistoryStorage>, key: impl Into<String>) -> Self {
        let mut store = Self {
            storage,
            key: key.into(),
            sessions: Vec::new(),
        };
        store.load();
        store
    }

    /// Reload every session from storage.
    ///
    /// Unreadable or unparseable storage is logged and treated as empty.
    pub fn load(&mut self) -> &[HistorySession] {
        self.sessions = match self.storage.read(&self.key) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<HistorySession>>(&blob) {
                Ok(mut sessions) => {
                    dedupe_by_id(&mut sessions);
                    sessions
                }
                Err(e) => {
                    warn!("History blob '{}' is unparseable, starting empty: {}", self.key, e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                error!("Failed to read history '{}': {:#}", self.key, e);
                Vec::new()
            }
        };

        info!("Loaded {} history session(s)", self.sessions.len());
        &self.sessions
    }

    /// Insert or replace the record with `session.id`.
    ///
    /// Keeps the stored `start_time` and recomputes the preview. Sessions
    /// without messages are never stored and yield `None`.
    pub fn upsert(&mut self, mut session: HistorySession) -> Option<&HistorySession> {
        if session.messages.is_empty() {
            warn!("Refusing to store session {} without messages", session.id);
            return None;
        }

        let existing = self.sessions.iter().position(|s| s.id == session.id);

        let prior_preview = match existing {
            Some(idx) => {
                session.start_time = self.sessions[idx].start_time;
                Some(self.sessions[idx].preview.clone())
            }
            None => Some(session.preview.clone()),
        };
        session.preview = derive_preview(&session, prior_preview.as_deref());

        let idx = match existing {
            Some(idx) => {
                self.sessions[idx] = session;
                idx
            }
            None => {
                self.sessions.push(session);
                self.sessions.len() - 1
            }
        };

        self.persist();
        Some(&self.sessions[idx])
    }

    fn persist(&self) {
        let blob = match serde_json::to_string(&self.sessions) {
            Ok(blob) => blob,
            Err(e) => {
                error!("Failed to serialize history: {}", e);
                return;
            }
        };

        match self.storage.write(&self.key, &blob) {
            Ok(()) => debug!("History written ({} sessions)", self.sessions.len()),
            Err(e) => error!("Failed to write history '{}': {:#}", self.key, e),
        }
    }

    pub fn sessions(&self) -> &[HistorySession] {
        &self.sessions
    }

    pub fn get(&self, id: &str) -> Option<&HistorySession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// Last record wins, at the position of the first occurrence
fn dedupe_by_id(sessions: &mut Vec<HistorySession>) {
    let mut out: Vec<HistorySession> = Vec::with_capacity(sessions.len());
    for session in sessions.drain(..) {
        match out.iter().position(|s| s.id == session.id) {
            Some(idx) => out[idx] = session,
            None => out.push(session),
        }
    }
    *sessions = out;
}
