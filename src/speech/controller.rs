use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::engine::{RecognitionError, StreamEvent, TranscriptionEngine};
use crate::interview::InputBuffer;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("speech recognition is not available")]
    Unavailable,

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error("transcription engine failed: {0:#}")]
    Engine(anyhow::Error),
}

/// Outcome of applying one stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechUpdate {
    /// Finalized text was appended to the input buffer
    Appended(String),
    /// The batch held only interim results
    Ignored,
    /// A "no speech" report was swallowed
    NoSpeech,
    /// The stream ended on silence and was reopened
    Restarted,
    /// The stream ended after a manual stop
    Stopped,
}

/// Keeps a continuous recognition stream alive until the user stops it.
///
/// Engines close their stream after a short silence. Unless the user asked
/// to stop, every end-of-stream is answered with a fresh `open`, so the user
/// sees one unbroken recording.
pub struct SpeechCaptureController {
    engine: Option<Arc<dyn TranscriptionEngine>>,
    locale: String,
    buffer: InputBuffer,
    stream: Option<mpsc::Receiver<StreamEvent>>,
    user_requested_stop: bool,
    restarts: usize,
}

impl SpeechCaptureController {
    /// `engine` is `None` when the platform has no transcription capability
    pub fn new(
        engine: Option<Arc<dyn TranscriptionEngine>>,
        locale: impl Into<String>,
        buffer: InputBuffer,
    ) -> Self {
        Self {
            engine,
            locale: locale.into(),
            buffer,
            stream: None,
            user_requested_stop: false,
            restarts: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.stream.is_some() && !self.user_requested_stop
    }

    /// A stream is open, possibly winding down after `stop()`
    pub fn has_open_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Automatic restarts since construction
    pub fn restart_count(&self) -> usize {
        self.restarts
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub async fn start(&mut self) -> Result<(), SpeechError> {
        let Some(engine) = self.engine.clone() else {
            return Err(SpeechError::Unavailable);
        };
        if self.is_listening() {
            debug!("Speech capture already listening");
            return Ok(());
        }

        self.user_requested_stop = false;
        match engine.open(&self.locale).await {
            Ok(stream) => self.stream = Some(stream),
            Err(e) => {
                self.stream = None;
                return Err(SpeechError::Engine(e));
            }
        }

        info!("Speech capture started ({}, {})", engine.name(), self.locale);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), SpeechError> {
        self.user_requested_stop = true;

        let Some(engine) = self.engine.clone() else {
            return Ok(());
        };
        if self.stream.is_none() {
            return Ok(());
        }

        info!("Speech capture stopping");
        if let Err(e) = engine.close().await {
            error!("Failed to close recognition stream: {:#}", e);
            self.stream = None;
            return Err(SpeechError::Engine(e));
        }
        Ok(())
    }

    /// Wait for the next stream event and apply it.
    ///
    /// Returns `None` when no stream is open.
    pub async fn next_update(&mut self) -> Option<Result<SpeechUpdate, SpeechError>> {
        let stream = self.stream.as_mut()?;
        // A stream that vanished without saying goodbye counts as ended
        let event = stream.recv().await.unwrap_or(StreamEvent::End);
        Some(self.handle_event(event).await)
    }

    pub async fn handle_event(&mut self, event: StreamEvent) -> Result<SpeechUpdate, SpeechError> {
        match event {
            StreamEvent::Results(segments) => {
                let text = segments
                    .iter()
                    .filter(|s| s.is_final())
                    .map(|s| s.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");

                if text.is_empty() {
                    return Ok(SpeechUpdate::Ignored);
                }
                self.buffer.push_fragment(&text);
                Ok(SpeechUpdate::Appended(text))
            }

            StreamEvent::Error(e) if e.is_benign() => {
                debug!("Recognition reported: {}", e);
                Ok(SpeechUpdate::NoSpeech)
            }

            StreamEvent::Error(e) => {
                warn!("Recognition failed, listening stopped: {}", e);
                self.stream = None;
                Err(SpeechError::Recognition(e))
            }

            StreamEvent::End => {
                if self.user_requested_stop {
                    self.stream = None;
                    info!("Speech capture stopped");
                    return Ok(SpeechUpdate::Stopped);
                }

                let Some(engine) = self.engine.clone() else {
                    self.stream = None;
                    return Ok(SpeechUpdate::Stopped);
                };

                match engine.open(&self.locale).await {
                    Ok(stream) => {
                        self.stream = Some(stream);
                        self.restarts += 1;
                        debug!("Recognition stream restarted ({})", self.restarts);
                        Ok(SpeechUpdate::Restarted)
                    }
                    Err(e) => {
                        error!("Failed to restart recognition stream: {:#}", e);
                        self.stream = None;
                        Err(SpeechError::Engine(e))
                    }
                }
            }
        }
    }
}
