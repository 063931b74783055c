use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{InterviewError, InterviewResult};
use super::input::InputBuffer;
use super::log::MessageLog;
use super::types::{EvaluationResult, Message, MessageKind, Phase, Sender, Topic};
use crate::generation::GenerationService;
use crate::history::{HistorySession, HistoryStore};

/// Shown in place of a question the service failed to generate
pub const QUESTION_FALLBACK: &str =
    "Sorry, something went wrong while generating the interview question. Please try again.";

/// Shown in place of an explanation the service failed to produce
pub const EXPLANATION_FALLBACK: &str =
    "Sorry, the explanation service is temporarily unavailable. Please try again later.";

/// Missing point recorded on a fallback evaluation
pub const SYSTEM_ERROR_POINT: &str = "system error";

/// Zero-score evaluation used when the service fails
pub fn fallback_evaluation() -> EvaluationResult {
    EvaluationResult::new(
        0,
        "The evaluation could not be completed. This result is a system placeholder.",
        vec![SYSTEM_ERROR_POINT.to_string()],
        "Not available",
    )
}

/// Settles the phase if an in-flight call is dropped before it finishes.
///
/// Holds only the phase fields, so the rest of the controller stays usable
/// while the call is outstanding.
struct InFlight<'a> {
    phase: &'a mut Phase,
    phase_tx: &'a watch::Sender<Phase>,
    settle_to: Phase,
    armed: bool,
}

impl InFlight<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!(
            "{} call abandoned, settling in {}",
            self.phase, self.settle_to
        );
        *self.phase = self.settle_to;
        self.phase_tx.send_replace(self.settle_to);
    }
}

/// Await `call`; if the future is dropped first, the phase becomes `settle_to`
async fn guarded<T>(
    phase: &mut Phase,
    phase_tx: &watch::Sender<Phase>,
    settle_to: Phase,
    call: impl Future<Output = T>,
) -> T {
    let guard = InFlight {
        phase,
        phase_tx,
        settle_to,
        armed: true,
    };
    let out = call.await;
    guard.disarm();
    out
}

/// Drives one interview: topic → question → answer → evaluation → follow-ups.
///
/// Every mutating operation takes `&mut self`, so at most one generation call
/// is outstanding per controller. The phase guards reject new work while a
/// call is in flight.
pub struct SessionController {
    service: Arc<dyn GenerationService>,
    history: HistoryStore,
    log: MessageLog,
    session_id: Option<String>,
    topic: Topic,
    question: Option<String>,
    phase: Phase,
    pending_input: InputBuffer,
    phase_tx: watch::Sender<Phase>,
}

impl SessionController {
    pub fn new(service: Arc<dyn GenerationService>, history: HistoryStore) -> Self {
        let (phase_tx, _) = watch::channel(Phase::Idle);
        Self {
            service,
            history,
            log: MessageLog::with_first(Message::welcome()),
            session_id: None,
            topic: Topic::default(),
            question: None,
            phase: Phase::Idle,
            pending_input: InputBuffer::new(),
            phase_tx,
        }
    }

    /// Use an existing buffer (e.g. one speech capture already writes into)
    pub fn with_input_buffer(mut self, buffer: InputBuffer) -> Self {
        self.pending_input = buffer;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn current_question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn pending_input(&self) -> &InputBuffer {
        &self.pending_input
    }

    /// Phase changes, including the in-flight ones
    pub fn subscribe_phase(&self) -> watch::Receiver<Phase> {
        self.phase_tx.subscribe()
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    fn set_phase(&mut self, phase: Phase) {
        debug!("Phase {} -> {}", self.phase, phase);
        self.phase = phase;
        self.phase_tx.send_replace(phase);
    }

    fn ensure_settled(&self) -> InterviewResult<()> {
        if self.phase.is_in_flight() {
            return Err(InterviewError::Busy(self.phase));
        }
        Ok(())
    }

    /// The user picked a topic from the topic list
    pub async fn select_topic(&mut self, topic: Topic) -> InterviewResult<()> {
        self.ensure_settled()?;
        self.topic = topic;
        self.start_topic(topic).await
    }

    /// Open a new session on `topic` and ask its first question
    pub async fn start_topic(&mut self, topic: Topic) -> InterviewResult<()> {
        self.ensure_settled()?;

        // Captured once; every write below goes to this id
        let session_id = format!("session-{}", uuid::Uuid::new_v4());
        info!("Starting session {} on {}", session_id, topic.id());

        self.session_id = Some(session_id.clone());
        self.topic = topic;
        self.question = None;
        self.log = MessageLog::with_first(Message::user_text(format!(
            "Let's start the interview on **{}**.",
            topic.label()
        )));
        self.set_phase(Phase::GeneratingQuestion);

        // Abandoned before a question arrived: nothing is active
        let service = Arc::clone(&self.service);
        let reply = guarded(
            &mut self.phase,
            &self.phase_tx,
            Phase::Idle,
            service.generate_question(topic),
        )
        .await;

        let question = match reply {
            Ok(question) => question,
            Err(e) => {
                warn!("Question generation failed for {}: {}", session_id, e);
                QUESTION_FALLBACK.to_string()
            }
        };

        self.log.append(Message::ai_text(question.clone()));
        self.question = Some(question);
        self.set_phase(Phase::AwaitingAnswer);
        self.persist(&session_id, topic);

        Ok(())
    }

    /// Submit an answer (while awaiting one) or a follow-up (while reviewing).
    ///
    /// Returns `Ok(false)` without touching anything when `text` is blank or
    /// no question is active.
    pub async fn submit_input(&mut self, text: &str) -> InterviewResult<bool> {
        self.ensure_settled()?;

        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        let (Some(session_id), Some(question)) = (self.session_id.clone(), self.question.clone())
        else {
            debug!("Input ignored: no active question");
            return Ok(false);
        };
        let topic = self.topic;

        self.log.append(Message::user_text(text));

        if self.phase == Phase::AwaitingAnswer {
            self.set_phase(Phase::Evaluating);
            self.persist(&session_id, topic);

            let service = Arc::clone(&self.service);
            let reply = guarded(
                &mut self.phase,
                &self.phase_tx,
                Phase::Reviewing,
                service.evaluate_answer(topic, &question, text),
            )
            .await;

            let evaluation = match reply {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    warn!("Evaluation failed for {}: {}", session_id, e);
                    fallback_evaluation()
                }
            };
            info!("Answer scored {} in {}", evaluation.score, session_id);
            self.log.append(Message::evaluation(evaluation));
        } else {
            self.set_phase(Phase::Explaining);
            self.persist(&session_id, topic);

            let service = Arc::clone(&self.service);
            let reply = guarded(
                &mut self.phase,
                &self.phase_tx,
                Phase::Reviewing,
                service.explain_concept(topic, &question, text),
            )
            .await;

            let explanation = match reply {
                Ok(explanation) => explanation,
                Err(e) => {
                    warn!("Explanation failed for {}: {}", session_id, e);
                    EXPLANATION_FALLBACK.to_string()
                }
            };
            self.log.append(Message::ai_text(explanation));
        }

        self.set_phase(Phase::Reviewing);
        self.persist(&session_id, topic);

        Ok(true)
    }

    /// Submit whatever is in the pending-input buffer.
    ///
    /// The text goes back into the buffer if nothing was submitted.
    pub async fn submit_pending(&mut self) -> InterviewResult<bool> {
        let text = self.pending_input.take();
        let result = self.submit_input(&text).await;
        if !matches!(result, Ok(true)) && !text.is_empty() {
            let newer = self.pending_input.take();
            self.pending_input.set(text);
            self.pending_input.push_fragment(&newer);
        }
        result
    }

    /// Leave the current question and ask a new one on the same topic
    pub async fn advance_to_next_question(&mut self) -> InterviewResult<()> {
        self.ensure_settled()?;
        if self.phase != Phase::Reviewing {
            return Err(InterviewError::NotReviewing(self.phase));
        }
        self.start_topic(self.topic).await
    }

    /// Resume a stored session
    pub fn load_history(&mut self, session: HistorySession) -> InterviewResult<()> {
        self.ensure_settled()?;

        let question = session
            .current_question
            .clone()
            .or_else(|| recover_question(&session.messages));
        let phase = match session.phase {
            Some(p) if p.is_in_flight() => Phase::Reviewing,
            Some(Phase::Idle) | None => reconstruct_phase(&session.messages, question.as_deref()),
            Some(p) => p,
        };

        info!(
            "Loaded session {} ({} messages, {})",
            session.id,
            session.messages.len(),
            phase
        );

        self.session_id = Some(session.id);
        self.topic = session.topic;
        self.question = question;
        self.log = MessageLog::from_snapshot(session.messages);
        self.pending_input.take();
        self.set_phase(phase);

        Ok(())
    }

    /// Resume the stored session with `id`
    pub fn load_history_by_id(&mut self, id: &str) -> InterviewResult<()> {
        let session = self
            .history
            .get(id)
            .cloned()
            .ok_or_else(|| InterviewError::SessionNotFound(id.to_string()))?;
        self.load_history(session)
    }

    fn persist(&mut self, session_id: &str, topic: Topic) {
        if self.log.len() <= 1 {
            debug!("Session {} has nothing worth storing yet", session_id);
            return;
        }

        let record = HistorySession {
            id: session_id.to_string(),
            topic,
            start_time: chrono::Utc::now().timestamp_millis(),
            messages: self.log.snapshot(),
            preview: String::new(),
            phase: Some(self.phase),
            current_question: self.question.clone(),
        };
        self.history.upsert(record);
    }
}

/// Phase for a stored session that did not record one
fn reconstruct_phase(messages: &[Message], question: Option<&str>) -> Phase {
    let Some(last) = messages.last() else {
        return Phase::Idle;
    };

    match (last.sender, last.kind) {
        (_, MessageKind::Evaluation) => Phase::Reviewing,
        (Sender::User, _) => Phase::Reviewing,
        (Sender::Ai, MessageKind::PlainText) if Some(last.content.as_str()) == question => {
            Phase::AwaitingAnswer
        }
        _ => Phase::Reviewing,
    }
}

/// Question for a stored session that did not record one: the AI text
/// nearest before the last evaluation, or the last AI text overall
fn recover_question(messages: &[Message]) -> Option<String> {
    let end = messages
        .iter()
        .rposition(|m| m.kind == MessageKind::Evaluation)
        .unwrap_or(messages.len());

    messages[..end]
        .iter()
        .rev()
        .find(|m| m.is_ai_text() && !m.is_welcome())
        .map(|m| m.content.clone())
}
