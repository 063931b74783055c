use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::generation::GenerationClientConfig;
use crate::history::DEFAULT_STORAGE_KEY;

/// Environment overrides look like `INTERVIEW__GENERATION__API_KEY`
pub const ENV_PREFIX: &str = "INTERVIEW";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub generation: GenerationConfig,
    pub history: HistoryConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Language questions, evaluations and explanations are written in
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub data_dir: String,
    pub storage_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    pub enabled: bool,
    pub nats_url: String,
    /// Recognition locale, e.g. "zh-CN"
    pub locale: String,
    pub silence_timeout_ms: u64,
}

impl Config {
    /// Defaults, then the optional file at `path`, then environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "mock-interview")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8787_i64)?
            .set_default("generation.endpoint", "https://api.openai.com")?
            .set_default("generation.model", "gpt-4o-mini")?
            .set_default("generation.timeout_secs", 60_i64)?
            .set_default("generation.language", "Simplified Chinese")?
            .set_default("history.data_dir", "~/.local/share/mock-interview")?
            .set_default("history.storage_key", DEFAULT_STORAGE_KEY)?
            .set_default("speech.enabled", true)?
            .set_default("speech.nats_url", "nats://localhost:4222")?
            .set_default("speech.locale", "zh-CN")?
            .set_default("speech.silence_timeout_ms", 3000_i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl GenerationConfig {
    pub fn client_config(&self) -> GenerationClientConfig {
        GenerationClientConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(self.timeout_secs),
            language: self.language.clone(),
        }
    }
}

impl HistoryConfig {
    /// `data_dir` with `~` expanded
    pub fn data_dir_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).into_owned())
    }
}

impl SpeechConfig {
    pub fn silence_timeout(&self) -> Duration {
        Duration::from_millis(self.silence_timeout_ms)
    }
}
