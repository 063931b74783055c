use anyhow::{Context, Result};
use async_nats::{Client, Subscriber};
use tracing::{debug, info};

use super::messages::{RecognitionRequest, RecognitionStop};

/// Subject the STT service listens on for new recognition streams
pub const START_SUBJECT: &str = "stt.control.start";
/// Subject the STT service listens on for stream shutdown
pub const STOP_SUBJECT: &str = "stt.control.stop";
/// Partial and final transcripts (`stt.text.partial`, `stt.text.final`)
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Ask the STT service to start transcribing for `request.session_id`
    pub async fn publish_start(&self, request: &RecognitionRequest) -> Result<()> {
        let payload = serde_json::to_vec(request)?;

        self.client
            .publish(START_SUBJECT, payload.into())
            .await
            .context("Failed to publish recognition request")?;

        debug!(
            "Requested recognition stream {} ({})",
            request.session_id, request.locale
        );

        Ok(())
    }

    /// Ask the STT service to stop transcribing for `session_id`
    pub async fn publish_stop(&self, session_id: &str) -> Result<()> {
        let payload = serde_json::to_vec(&RecognitionStop {
            session_id: session_id.to_string(),
        })?;

        self.client
            .publish(STOP_SUBJECT, payload.into())
            .await
            .context("Failed to publish recognition stop")?;

        debug!("Requested stop of recognition stream {}", session_id);

        Ok(())
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<Subscriber> {
        // Transcripts for every stream arrive here; callers filter by session_id
        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT)
            .await
            .context("Failed to subscribe to transcripts")?;

        debug!("Subscribed to {}", TRANSCRIPT_SUBJECT);

        Ok(subscriber)
    }
}
