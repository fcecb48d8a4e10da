use crate::audio::{AudioDumper, ClipStore};
use crate::config::Config;
use crate::language::LanguageDetector;
use crate::pipeline::TranslationPipeline;
use crate::providers::Providers;
use crate::session::{SessionConfig, SessionRegistry};
use crate::telephony::TelephonyClient;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Active calls and media streams
    pub registry: Arc<SessionRegistry>,

    pub pipeline: Arc<TranslationPipeline>,

    /// Synthesized clips served for `<Play>`
    pub clips: Arc<ClipStore>,

    pub telephony: TelephonyClient,

    /// WAV dumps of outbound audio, when `audio.dump_dir` is set
    pub dumper: Option<Arc<AudioDumper>>,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// State with providers chosen from the configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        Self::new(config, providers)
    }

    pub fn new(config: Config, providers: Providers) -> Result<Self> {
        let detector = LanguageDetector::new(config.translation.min_confidence);
        let pipeline = TranslationPipeline::new(
            providers,
            config.translation.cache_capacity,
            detector,
        );

        let telephony =
            TelephonyClient::new(&config.telephony).context("Failed to create telephony client")?;

        let dumper = match &config.audio.dump_dir {
            Some(dir) => Some(Arc::new(AudioDumper::new(dir)?)),
            None => None,
        };

        let registry = SessionRegistry::with_capacity(config.telephony.max_tracked_calls);

        Ok(Self {
            clips: Arc::new(ClipStore::new(config.audio.clip_capacity)),
            config: Arc::new(config),
            registry: Arc::new(registry),
            pipeline: Arc::new(pipeline),
            telephony,
            dumper,
            started_at: Utc::now(),
        })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::from_config(&self.config)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("{}{}", self.config.http_base(), path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("{}{}", self.config.ws_base(), path)
    }
}
