// Shared fakes for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use mock_interview::{
    EvaluationResult, GenerationError, GenerationService, HistoryStore, MemoryHistoryStorage,
    SessionController, Topic,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const STORAGE_KEY: &str = "interview_history";

/// Generation service with predictable output.
///
/// Questions are numbered `Q1`, `Q2`, ... across all topics.
#[derive(Default)]
pub struct FakeService {
    questions: AtomicUsize,
    pub fail: AtomicBool,
    pub score: AtomicUsize,
    /// When set, every call waits for a permit first
    pub gate: Option<Arc<Semaphore>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            score: AtomicUsize::new(90),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let service = Self::new();
        service.fail.store(true, Ordering::SeqCst);
        service
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    async fn pass_gate(&self) -> Result<(), GenerationError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| GenerationError::NotConfigured)?
                .forget();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(GenerationError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GenerationService for FakeService {
    async fn generate_question(&self, _topic: Topic) -> Result<String, GenerationError> {
        self.pass_gate().await?;
        let n = self.questions.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("Q{n}"))
    }

    async fn evaluate_answer(
        &self,
        _topic: Topic,
        _question: &str,
        answer: &str,
    ) -> Result<EvaluationResult, GenerationError> {
        self.pass_gate().await?;
        Ok(EvaluationResult::new(
            self.score.load(Ordering::SeqCst) as i64,
            format!("Reviewed: {answer}"),
            Vec::new(),
            "The ideal answer",
        ))
    }

    async fn explain_concept(
        &self,
        _topic: Topic,
        _question: &str,
        follow_up: &str,
    ) -> Result<String, GenerationError> {
        self.pass_gate().await?;
        Ok(format!("Explanation of {follow_up}"))
    }
}

pub fn memory_store(storage: &MemoryHistoryStorage) -> HistoryStore {
    HistoryStore::open(Box::new(storage.clone()), STORAGE_KEY)
}

pub fn controller_with(service: FakeService, storage: &MemoryHistoryStorage) -> SessionController {
    SessionController::new(Arc::new(service), memory_store(storage))
}
