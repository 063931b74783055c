pub mod config;
pub mod generation;
pub mod history;
pub mod http;
pub mod interview;
pub mod nats;
pub mod repl;
pub mod speech;

pub use config::Config;
pub use generation::{GenerationClient, GenerationError, GenerationService};
pub use history::{FileHistoryStorage, HistorySession, HistoryStore, MemoryHistoryStorage};
pub use http::{create_router, AppState};
pub use interview::{
    EvaluationResult, InputBuffer, InterviewError, Message, MessageKind, MessageLog, Phase,
    Sender, SessionController, Topic,
};
pub use nats::{NatsClient, TranscriptMessage};
pub use speech::{
    NatsTranscriptionEngine, SpeechCaptureController, SpeechError, SpeechUpdate,
    TranscriptSegment, TranscriptionEngine,
};
