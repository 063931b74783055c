// Integration tests for continuous speech capture
//
// A scripted engine hands the test the sender side of every stream it
// opens, so events can be injected one at a time.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use mock_interview::speech::{RecognitionError, StreamEvent};
use mock_interview::{
    InputBuffer, SpeechCaptureController, SpeechError, SpeechUpdate, TranscriptSegment,
    TranscriptionEngine,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
struct ScriptedEngine {
    opens: AtomicUsize,
    closes: AtomicUsize,
    fail_open: AtomicBool,
    streams: Mutex<Vec<mpsc::Sender<StreamEvent>>>,
}

impl ScriptedEngine {
    fn latest(&self) -> mpsc::Sender<StreamEvent> {
        self.streams
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("a stream was opened")
    }
}

#[async_trait]
impl TranscriptionEngine for ScriptedEngine {
    async fn open(&self, _locale: &str) -> Result<mpsc::Receiver<StreamEvent>> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(anyhow!("microphone busy"));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(16);
        self.streams.lock().unwrap().push(tx);
        Ok(rx)
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        // Like a real engine, a closed stream still reports its end
        let tx = self.latest();
        tx.send(StreamEvent::End).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn segment(text: &str, partial: bool) -> TranscriptSegment {
    TranscriptSegment {
        text: text.to_string(),
        timestamp: Utc::now(),
        confidence: Some(0.9),
        partial,
    }
}

fn capture(engine: &Arc<ScriptedEngine>) -> (SpeechCaptureController, InputBuffer) {
    let buffer = InputBuffer::new();
    let engine: Arc<dyn TranscriptionEngine> = engine.clone();
    let controller = SpeechCaptureController::new(Some(engine), "zh-CN", buffer.clone());
    (controller, buffer)
}

#[tokio::test]
async fn test_only_final_results_reach_buffer() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, buffer) = capture(&engine);
    speech.start().await?;
    assert!(speech.is_listening());

    let tx = engine.latest();
    tx.send(StreamEvent::Results(vec![segment("use a", true)])).await?;
    tx.send(StreamEvent::Results(vec![segment("use a write", true), segment("use a write-through cache", false)]))
        .await?;

    assert_eq!(speech.next_update().await.transpose()?, Some(SpeechUpdate::Ignored));
    assert_eq!(
        speech.next_update().await.transpose()?,
        Some(SpeechUpdate::Appended("use a write-through cache".to_string()))
    );
    assert_eq!(buffer.snapshot(), "use a write-through cache");

    Ok(())
}

#[tokio::test]
async fn test_stream_restarts_on_silence() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, buffer) = capture(&engine);
    speech.start().await?;

    engine.latest().send(StreamEvent::Results(vec![segment("first part", false)])).await?;
    engine.latest().send(StreamEvent::End).await?;
    speech.next_update().await.transpose()?;

    assert_eq!(speech.next_update().await.transpose()?, Some(SpeechUpdate::Restarted));
    assert_eq!(engine.opens.load(Ordering::SeqCst), 2);
    assert_eq!(speech.restart_count(), 1);
    assert!(speech.is_listening());

    engine.latest().send(StreamEvent::Results(vec![segment("second part", false)])).await?;
    speech.next_update().await.transpose()?;
    assert_eq!(buffer.snapshot(), "first part second part");

    Ok(())
}

#[tokio::test]
async fn test_stop_ends_without_restart() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, _buffer) = capture(&engine);
    speech.start().await?;

    speech.stop().await?;
    assert!(!speech.is_listening());
    assert!(speech.has_open_stream(), "stream drains until it reports its end");

    assert_eq!(speech.next_update().await.transpose()?, Some(SpeechUpdate::Stopped));
    assert!(!speech.has_open_stream());
    assert_eq!(engine.opens.load(Ordering::SeqCst), 1);
    assert_eq!(engine.closes.load(Ordering::SeqCst), 1);
    assert!(speech.next_update().await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_no_speech_is_ignored() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, buffer) = capture(&engine);
    speech.start().await?;

    engine.latest().send(StreamEvent::Error(RecognitionError::NoSpeech)).await?;
    assert_eq!(speech.next_update().await.transpose()?, Some(SpeechUpdate::NoSpeech));
    assert!(speech.is_listening());
    assert!(buffer.is_blank());

    Ok(())
}

#[tokio::test]
async fn test_other_errors_stop_listening() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, _buffer) = capture(&engine);
    speech.start().await?;

    engine
        .latest()
        .send(StreamEvent::Error(RecognitionError::Network("offline".to_string())))
        .await?;
    let update = speech.next_update().await.expect("stream was open");
    assert!(matches!(
        update,
        Err(SpeechError::Recognition(RecognitionError::Network(_)))
    ));
    assert!(!speech.is_listening());
    assert!(!speech.has_open_stream());

    Ok(())
}

#[tokio::test]
async fn test_dropped_stream_counts_as_end() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, _buffer) = capture(&engine);
    speech.start().await?;

    engine.streams.lock().unwrap().clear();
    assert_eq!(speech.next_update().await.transpose()?, Some(SpeechUpdate::Restarted));

    Ok(())
}

#[tokio::test]
async fn test_failed_restart_stops_listening() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, _buffer) = capture(&engine);
    speech.start().await?;

    engine.fail_open.store(true, Ordering::SeqCst);
    engine.latest().send(StreamEvent::End).await?;
    let update = speech.next_update().await.expect("stream was open");
    assert!(matches!(update, Err(SpeechError::Engine(_))));
    assert!(!speech.is_listening());

    Ok(())
}

#[tokio::test]
async fn test_start_is_idempotent() -> Result<()> {
    let engine = Arc::new(ScriptedEngine::default());
    let (mut speech, _buffer) = capture(&engine);

    speech.start().await?;
    speech.start().await?;
    assert_eq!(engine.opens.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_missing_engine_is_unavailable() -> Result<()> {
    let buffer = InputBuffer::new();
    let mut speech = SpeechCaptureController::new(None, "zh-CN", buffer.clone());

    assert!(!speech.is_available());
    assert!(matches!(speech.start().await, Err(SpeechError::Unavailable)));
    assert!(!speech.is_listening());
    speech.stop().await?;

    // Typed input still works
    buffer.push_fragment("typed answer");
    assert_eq!(buffer.snapshot(), "typed answer");

    Ok(())
}
