use crate::interview::{Phase, SessionController};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single interview controller; operations serialize on this lock
    pub controller: Arc<Mutex<SessionController>>,

    /// Phase feed readable while an operation holds the lock
    pub phase: watch::Receiver<Phase>,

    /// Held for the whole of a mutating operation; readers never take it
    pub operation: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(controller: SessionController) -> Self {
        let phase = controller.subscribe_phase();
        Self {
            controller: Arc::new(Mutex::new(controller)),
            phase,
            operation: Arc::new(Mutex::new(())),
        }
    }
}
