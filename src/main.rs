use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mock_interview::{
    create_router, AppState, Config, FileHistoryStorage, GenerationClient, GenerationService,
    HistoryStore, NatsTranscriptionEngine, SessionController, SpeechCaptureController,
    TranscriptionEngine,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mock-interview", version, about = "AI mock technical interviewer")]
struct Args {
    /// Config file, without extension
    #[arg(long, default_value = "config/mock-interview")]
    config: String,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Interactive interview in the terminal (default)
    Chat,
    /// Serve the interview over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mode = args.command.unwrap_or(Mode::Chat);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match mode {
        // Keep log lines out of the conversation on stdout
        Mode::Chat => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        Mode::Serve => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let cfg = Config::load(&args.config)?;
    info!("Mock Interview v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let service: Arc<dyn GenerationService> =
        Arc::new(GenerationClient::new(cfg.generation.client_config())?);
    info!("Generation model: {} at {}", cfg.generation.model, cfg.generation.endpoint);

    let data_dir = cfg.history.data_dir_path();
    let storage = FileHistoryStorage::new(&data_dir)
        .with_context(|| format!("Cannot open history directory {}", data_dir.display()))?;
    let history = HistoryStore::open(Box::new(storage), &cfg.history.storage_key);
    info!("History: {} stored sessions in {}", history.len(), data_dir.display());

    let controller = SessionController::new(service, history);

    match mode {
        Mode::Serve => {
            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let app = create_router(AppState::new(controller));

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Cannot bind {}", addr))?;
            info!("HTTP server listening on {}", addr);
            axum::serve(listener, app).await?;
        }
        Mode::Chat => {
            let engine: Option<Arc<dyn TranscriptionEngine>> = if cfg.speech.enabled {
                match NatsTranscriptionEngine::connect(&cfg.speech.nats_url, cfg.speech.silence_timeout())
                    .await
                {
                    Ok(engine) => Some(Arc::new(engine)),
                    Err(e) => {
                        warn!("Speech capture disabled: {:#}", e);
                        None
                    }
                }
            } else {
                None
            };

            let speech = SpeechCaptureController::new(
                engine,
                cfg.speech.locale.clone(),
                controller.pending_input().clone(),
            );
            mock_interview::repl::run(controller, speech).await?;
        }
    }

    Ok(())
}
