use async_trait::async_trait;
use tracing::debug;

use super::{
    untranslated, OutputFormat, RecognitionRequest, SpeechRecognizer, SpeechSynthesizer,
    Transcript, Translator,
};
use crate::error::{ProviderError, ProviderResult};
use crate::language::Language;

/// Recognizer used without cloud credentials; accepts audio and hears nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentRecognizer;

#[async_trait]
impl SpeechRecognizer for SilentRecognizer {
    async fn recognize(&self, request: RecognitionRequest) -> ProviderResult<Option<Transcript>> {
        debug!(
            "Offline recognizer discarding {} bytes of audio",
            request.audio.len()
        );
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

/// (Hindi, English) pairs understood without a translation API
const PHRASES: &[(&str, &str)] = &[
    ("namaste", "hello"),
    ("namaskar", "greetings"),
    ("aap kaise hain", "how are you"),
    ("aap kaise ho", "how are you"),
    ("kaise ho", "how are you"),
    ("main theek hun", "i am fine"),
    ("dhanyawad", "thank you"),
    ("shukriya", "thanks"),
    ("alvida", "goodbye"),
    ("haan", "yes"),
    ("nahi", "no"),
    ("kya haal hai", "how is it going"),
    ("aap kahan se hain", "where are you from"),
    ("main ghar ja raha hun", "i am going home"),
];

/// Phrase-table translator; unknown text is returned unchanged
#[derive(Debug, Clone)]
pub struct PhraseTranslator {
    phrases: Vec<(String, String)>,
}

impl Default for PhraseTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl PhraseTranslator {
    pub fn new() -> Self {
        Self {
            phrases: PHRASES
                .iter()
                .map(|(hi, en)| (hi.to_string(), en.to_string()))
                .collect(),
        }
    }

    fn normalise(text: &str) -> String {
        text.split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn lookup(&self, text: &str, source: Language, target: Language) -> Option<&str> {
        let key = Self::normalise(text);
        self.phrases.iter().find_map(|(hi, en)| match (source, target) {
            (Language::Hindi, Language::English) if *hi == key => Some(en.as_str()),
            (Language::English, Language::Hindi) if *en == key => Some(hi.as_str()),
            _ => None,
        })
    }
}

#[async_trait]
impl Translator for PhraseTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> ProviderResult<String> {
        if let Some(unchanged) = untranslated(text, source, target) {
            return Ok(unchanged);
        }

        Ok(self
            .lookup(text, source, target)
            .map(str::to_string)
            .unwrap_or_else(|| text.to_string()))
    }

    fn name(&self) -> &'static str {
        "phrase-table"
    }
}

/// Synthesizer used without cloud credentials; callers fall back to `<Say>`
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableSynthesizer;

#[async_trait]
impl SpeechSynthesizer for UnavailableSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        _language: Language,
        _format: OutputFormat,
    ) -> ProviderResult<Vec<u8>> {
        Err(ProviderError::Unavailable(
            "speech synthesis requires a Google API key".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
