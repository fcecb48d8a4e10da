use crate::config::{Config, VadConfig};
use std::time::Duration;

/// Per-stream tuning derived from the service configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// µ-law bytes buffered before a chunk is flushed mid-speech
    pub buffer_bytes: usize,

    /// Shorter utterances are discarded when speech ends
    pub min_utterance_bytes: usize,

    /// Minimum gap between two accepted transcripts
    pub min_interval: Duration,

    /// Transcripts below this recognition confidence are ignored
    pub min_confidence: f32,

    pub vad: VadConfig,

    /// Capacity of the outbound audio queue
    pub outbox_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            buffer_bytes: config.translation.buffer_bytes,
            min_utterance_bytes: config.translation.min_utterance_bytes,
            min_interval: Duration::from_millis(config.translation.min_interval_ms),
            min_confidence: config.translation.min_confidence,
            vad: config.vad.clone(),
            outbox_capacity: 32,
        }
    }
}
