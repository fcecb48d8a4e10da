use crate::language::Language;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `TRANSLATOR__TELEPHONY__FORWARD_TO_NUMBER`
const ENV_PREFIX: &str = "TRANSLATOR";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub telephony: TelephonyConfig,
    pub google: GoogleConfig,
    pub translation: TranslationConfig,
    pub vad: VadConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
    /// Public host used when building callback and stream URLs
    pub public_domain: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "call-translator".to_string(),
            http: HttpConfig::default(),
            public_domain: "localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// How an incoming call is handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    /// Bidirectional media stream on the incoming call itself
    #[default]
    Stream,
    /// Dial the forward number and stream both legs
    Forward,
    /// Bridge caller and forward number through a conference room
    Conference,
    /// Record an utterance, translate it, and reply
    Record,
    /// Use the provider's speech gather and reply
    Gather,
    /// Plain call forwarding without translation
    Direct,
}

impl CallMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallMode::Stream => "stream",
            CallMode::Forward => "forward",
            CallMode::Conference => "conference",
            CallMode::Record => "record",
            CallMode::Gather => "gather",
            CallMode::Direct => "direct",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelephonyConfig {
    pub mode: CallMode,
    pub forward_to_number: Option<String>,
    /// Number used as caller ID for outbound legs
    pub caller_id: Option<String>,
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub api_base_url: String,
    /// Call records kept in memory; the oldest finished ones are evicted
    pub max_tracked_calls: usize,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            mode: CallMode::default(),
            forward_to_number: None,
            caller_id: None,
            account_sid: None,
            auth_token: None,
            api_base_url: "https://api.twilio.com".to_string(),
            max_tracked_calls: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Without a key the service runs on offline providers
    pub api_key: Option<String>,
    pub speech_url: String,
    pub translate_url: String,
    pub tts_url: String,
    pub speech_model: String,
    pub use_enhanced: bool,
    pub request_timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            speech_url: "https://speech.googleapis.com/v1/speech:recognize".to_string(),
            translate_url: "https://translation.googleapis.com/language/translate/v2".to_string(),
            tts_url: "https://texttospeech.googleapis.com/v1/text:synthesize".to_string(),
            speech_model: "latest_short".to_string(),
            use_enhanced: true,
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Language the caller is expected to speak
    pub primary_language: Language,
    /// Language of the other party
    pub secondary_language: Language,
    /// Minimum gap between two translations on one stream
    pub min_interval_ms: u64,
    pub min_confidence: f32,
    pub cache_capacity: usize,
    /// µ-law bytes accumulated before a chunk is recognized (8000 bytes = 1s)
    pub buffer_bytes: usize,
    /// Shortest utterance flushed when speech ends early
    pub min_utterance_bytes: usize,
    pub speaking_rate: f32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            primary_language: Language::Hindi,
            secondary_language: Language::English,
            min_interval_ms: 2000,
            min_confidence: 0.6,
            cache_capacity: 100,
            buffer_bytes: 16000,
            min_utterance_bytes: 4000,
            speaking_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// Normalised RMS (0.0 - 1.0) above which a frame counts as voice
    pub threshold: f64,
    /// Quiet frames tolerated before speech is considered finished
    pub silence_frames: u32,
    pub history_len: usize,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            threshold: 0.01,
            silence_frames: 10,
            history_len: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Directory for WAV dumps of synthesized output (disabled when unset)
    pub dump_dir: Option<String>,
    pub clip_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            dump_dir: None,
            clip_capacity: 64,
        }
    }
}

impl Config {
    /// Load from an optional file plus `TRANSLATOR__*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX).separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;

        Ok(config)
    }

    /// Load a single configuration file, ignoring the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.translation.primary_language == self.translation.secondary_language {
            anyhow::bail!("primary_language and secondary_language must differ");
        }
        if !(0.0..=1.0).contains(&self.vad.threshold) {
            anyhow::bail!("vad.threshold must be within 0.0 and 1.0");
        }
        if self.telephony.max_tracked_calls == 0 {
            anyhow::bail!("telephony.max_tracked_calls must be greater than zero");
        }
        if self.translation.buffer_bytes == 0 {
            anyhow::bail!("translation.buffer_bytes must be greater than zero");
        }
        if matches!(
            self.telephony.mode,
            CallMode::Forward | CallMode::Conference | CallMode::Direct
        ) && self.telephony.forward_to_number.is_none()
        {
            tracing::warn!(
                "Mode {} has no forward_to_number; calls will be rejected",
                self.telephony.mode.as_str()
            );
        }
        Ok(())
    }

    /// `https://` base for webhook callbacks
    pub fn http_base(&self) -> String {
        format!("https://{}", self.service.public_domain)
    }

    /// `wss://` base for media streams
    pub fn ws_base(&self) -> String {
        format!("wss://{}", self.service.public_domain)
    }

    pub fn google_available(&self) -> bool {
        self.google
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.telephony.mode, CallMode::Stream);
        assert_eq!(config.translation.buffer_bytes, 16000);
        assert!(!config.google_available());
    }

    #[test]
    fn test_same_languages_rejected() {
        let mut config = Config::default();
        config.translation.secondary_language = Language::Hindi;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_bases() {
        let mut config = Config::default();
        config.service.public_domain = "example.ngrok.app".to_string();
        assert_eq!(config.http_base(), "https://example.ngrok.app");
        assert_eq!(config.ws_base(), "wss://example.ngrok.app");
    }
}
