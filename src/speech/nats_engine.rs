use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::engine::{RecognitionError, StreamEvent, TranscriptSegment, TranscriptionEngine};
use crate::nats::{NatsClient, RecognitionRequest, TranscriptMessage};

struct ActiveStream {
    session_id: String,
    stop_tx: oneshot::Sender<()>,
}

/// Transcription through an STT service reachable over NATS
pub struct NatsTranscriptionEngine {
    client: NatsClient,
    silence_timeout: Duration,
    active: Mutex<Option<ActiveStream>>,
}

impl NatsTranscriptionEngine {
    pub fn new(client: NatsClient, silence_timeout: Duration) -> Self {
        Self {
            client,
            silence_timeout,
            active: Mutex::new(None),
        }
    }

    pub async fn connect(url: &str, silence_timeout: Duration) -> Result<Self> {
        let client = NatsClient::connect(url)
            .await
            .context("Transcription engine unavailable")?;
        Ok(Self::new(client, silence_timeout))
    }
}

#[async_trait]
impl TranscriptionEngine for NatsTranscriptionEngine {
    async fn open(&self, locale: &str) -> Result<mpsc::Receiver<StreamEvent>> {
        let session_id = format!("capture-{}", uuid::Uuid::new_v4());

        // Subscribe first so early transcripts are not missed
        let subscriber = self.client.subscribe_transcripts().await?;
        self.client
            .publish_start(&RecognitionRequest {
                session_id: session_id.clone(),
                locale: locale.to_string(),
                interim_results: true,
                continuous: true,
            })
            .await?;

        let (tx, rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = oneshot::channel();

        {
            let mut active = self.active.lock().await;
            if let Some(previous) = active.replace(ActiveStream {
                session_id: session_id.clone(),
                stop_tx,
            }) {
                debug!("Superseding recognition stream {}", previous.session_id);
                let _ = previous.stop_tx.send(());
            }
        }

        let client = self.client.clone();
        let silence = self.silence_timeout;
        let payloads = subscriber.map(|msg| msg.payload.to_vec());

        tokio::spawn(async move {
            info!("Recognition stream {} started", session_id);

            forward_transcripts(&session_id, silence, payloads, stop_rx, &tx).await;

            if let Err(e) = client.publish_stop(&session_id).await {
                warn!("Failed to stop recognition stream {}: {:#}", session_id, e);
            }
            let _ = tx.send(StreamEvent::End).await;
            info!("Recognition stream {} ended", session_id);
        });

        Ok(rx)
    }

    async fn close(&self) -> Result<()> {
        if let Some(active) = self.active.lock().await.take() {
            debug!("Closing recognition stream {}", active.session_id);
            let _ = active.stop_tx.send(());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Turn transcript payloads for `session_id` into stream events.
///
/// Returns on a stop request, on a closed subscription, or once `silence`
/// passes without a transcript for this session. Transcripts for other
/// sessions do not hold the stream open.
async fn forward_transcripts<S>(
    session_id: &str,
    silence: Duration,
    payloads: S,
    mut stop_rx: oneshot::Receiver<()>,
    tx: &mpsc::Sender<StreamEvent>,
) where
    S: Stream<Item = Vec<u8>>,
{
    tokio::pin!(payloads);
    let deadline = tokio::time::sleep(silence);
    tokio::pin!(deadline);
    let mut heard = false;

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                debug!("Recognition stream {} closed on request", session_id);
                return;
            }
            _ = &mut deadline => {
                if !heard {
                    let _ = tx.send(StreamEvent::Error(RecognitionError::NoSpeech)).await;
                }
                return;
            }
            next = payloads.next() => {
                let Some(payload) = next else {
                    let _ = tx
                        .send(StreamEvent::Error(RecognitionError::Network(
                            "transcript subscription closed".to_string(),
                        )))
                        .await;
                    return;
                };

                match serde_json::from_slice::<TranscriptMessage>(&payload) {
                    Ok(transcript) if transcript.session_id == session_id => {
                        heard = true;
                        deadline.as_mut().reset(Instant::now() + silence);
                        let segment = TranscriptSegment {
                            timestamp: DateTime::parse_from_rfc3339(&transcript.timestamp)
                                .map(|t| t.with_timezone(&Utc))
                                .unwrap_or_else(|_| Utc::now()),
                            text: transcript.text,
                            confidence: transcript.confidence,
                            partial: transcript.partial,
                        };
                        if tx.send(StreamEvent::Results(vec![segment])).await.is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to parse transcript message: {}", e),
                }
            }
        }
    }
}
