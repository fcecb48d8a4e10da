//! Recognition, translation and synthesis glued together with the cache and
//! the language detector.
//!
//! Every step is best effort: provider failures are logged and degrade to "no
//! transcript", "original text" or "no audio" rather than an error.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::audio::codec::TELEPHONY_SAMPLE_RATE;
use crate::cache::{CacheStats, TranslationCache};
use crate::language::{Language, LanguageDetector};
use crate::providers::{
    untranslated, AudioEncoding, OutputFormat, Providers, RecognitionRequest, Transcript,
};

/// Result of translating one utterance
#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutcome {
    pub original: String,
    pub translated: String,
    pub source: Language,
    pub target: Language,
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

impl TranslationOutcome {
    pub fn has_audio(&self) -> bool {
        self.audio.as_ref().map(|a| !a.is_empty()).unwrap_or(false)
    }
}

pub struct TranslationPipeline {
    providers: Providers,
    cache: TranslationCache,
    detector: LanguageDetector,
}

impl TranslationPipeline {
    pub fn new(providers: Providers, cache_capacity: usize, detector: LanguageDetector) -> Self {
        Self {
            providers,
            cache: TranslationCache::new(cache_capacity),
            detector,
        }
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn detector(&self) -> &LanguageDetector {
        &self.detector
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn detect(&self, text: &str) -> Language {
        self.detector.detect(text)
    }

    /// Source language of a recognized utterance.
    ///
    /// A confident detection wins. Otherwise Hindi markers decide, then the
    /// language the recognizer reported.
    pub fn detect_spoken(
        &self,
        text: &str,
        confidence: Option<f32>,
        reported: Option<Language>,
    ) -> Language {
        if let Some(language) =
            confidence.and_then(|c| self.detector.detect_with_confidence(text, c))
        {
            return language;
        }

        match self.detector.detect(text) {
            Language::Hindi => Language::Hindi,
            Language::English => reported.unwrap_or(Language::English),
        }
    }

    /// Recognize 8 kHz µ-law audio from a media stream
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: Language,
        alternatives: &[Language],
    ) -> Option<Transcript> {
        self.recognize(RecognitionRequest {
            audio,
            encoding: AudioEncoding::Mulaw,
            sample_rate: TELEPHONY_SAMPLE_RATE,
            language,
            alternative_languages: alternatives.to_vec(),
        })
        .await
    }

    pub async fn recognize(&self, request: RecognitionRequest) -> Option<Transcript> {
        if request.audio.is_empty() {
            return None;
        }

        match self.providers.recognizer.recognize(request).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!("Speech recognition failed: {}", e);
                None
            }
        }
    }

    /// Translate through the cache; the original text is returned on failure
    pub async fn translate(&self, text: &str, source: Language, target: Language) -> String {
        if let Some(unchanged) = untranslated(text, source, target) {
            return unchanged;
        }

        if let Some(hit) = self.cache.get(text, source, target) {
            debug!("Translation cache hit for {:?}", text);
            return hit;
        }

        match self
            .providers
            .translator
            .translate(text, source, target)
            .await
        {
            Ok(translated) => {
                self.cache.insert(text, source, target, translated.clone());
                translated
            }
            Err(e) => {
                warn!("Translation {} -> {} failed: {}", source, target, e);
                text.to_string()
            }
        }
    }

    pub async fn synthesize(
        &self,
        text: &str,
        language: Language,
        format: OutputFormat,
    ) -> Option<Vec<u8>> {
        if text.trim().is_empty() {
            return None;
        }

        match self
            .providers
            .synthesizer
            .synthesize(text, language, format)
            .await
        {
            Ok(audio) if !audio.is_empty() => Some(audio),
            Ok(_) => None,
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                None
            }
        }
    }

    pub async fn process_utterance(
        &self,
        text: &str,
        source: Language,
        target: Language,
        format: OutputFormat,
    ) -> TranslationOutcome {
        let translated = self.translate(text, source, target).await;
        let audio = self.synthesize(&translated, target, format).await;

        TranslationOutcome {
            original: text.to_string(),
            translated,
            source,
            target,
            audio,
        }
    }
}

/// Shared handle used by the HTTP layer
pub type SharedPipeline = Arc<TranslationPipeline>;
