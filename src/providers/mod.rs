//! Speech recognition, translation and synthesis providers.
//!
//! The cloud services sit behind async traits so the pipeline and the HTTP
//! layer never talk to a vendor directly. [`Providers::from_config`] wires the
//! Google Cloud REST implementations when an API key is configured and the
//! offline fallbacks otherwise.

mod google;
mod offline;

pub use google::GoogleCloud;
pub use offline::{PhraseTranslator, SilentRecognizer, UnavailableSynthesizer};

use crate::config::Config;
use crate::error::ProviderResult;
use crate::language::Language;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Encoding of audio sent for recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    /// G.711 µ-law bytes straight from the media stream
    Mulaw,
    /// Little-endian 16-bit PCM
    Linear16,
}

#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub audio: Vec<u8>,
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub language: Language,
    pub alternative_languages: Vec<Language>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
    /// Language reported by the recognizer, when it reports one
    pub language: Option<Language>,
}

/// Audio format requested from the synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw 8 kHz µ-law for media streams
    Mulaw8k,
    /// MP3 for `<Play>`
    Mp3,
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// `Ok(None)` when nothing intelligible was heard
    async fn recognize(&self, request: RecognitionRequest) -> ProviderResult<Option<Transcript>>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> ProviderResult<String>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        format: OutputFormat,
    ) -> ProviderResult<Vec<u8>>;

    fn name(&self) -> &'static str;
}

/// Text that needs no translation: blank, or source equals target
pub(crate) fn untranslated(text: &str, source: Language, target: Language) -> Option<String> {
    if source == target || text.trim().is_empty() {
        Some(text.to_string())
    } else {
        None
    }
}

/// The provider set used by one service instance
#[derive(Clone)]
pub struct Providers {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Providers {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            recognizer,
            translator,
            synthesizer,
        }
    }

    pub fn offline() -> Self {
        Self::new(
            Arc::new(SilentRecognizer),
            Arc::new(PhraseTranslator::new()),
            Arc::new(UnavailableSynthesizer),
        )
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        if config.google_available() {
            let google = Arc::new(GoogleCloud::new(&config.google, &config.translation)?);
            info!("Using Google Cloud speech, translation and TTS");
            Ok(Self::new(google.clone(), google.clone(), google))
        } else {
            warn!("No Google API key configured; running with offline providers");
            Ok(Self::offline())
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "recognizer={}, translator={}, synthesizer={}",
            self.recognizer.name(),
            self.translator.name(),
            self.synthesizer.name()
        )
    }
}
