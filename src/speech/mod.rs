//! Continuous speech capture
//!
//! - `SpeechCaptureController` - start/stop, restart-on-silence, finalized
//!   text into the pending-input buffer
//! - `TranscriptionEngine` - the platform capability it drives
//! - `NatsTranscriptionEngine` - engine backed by an STT service over NATS

mod controller;
mod engine;
mod nats_engine;

pub use controller::{SpeechCaptureController, SpeechError, SpeechUpdate};
pub use engine::{RecognitionError, StreamEvent, TranscriptSegment, TranscriptionEngine};
pub use nats_engine::NatsTranscriptionEngine;
