// Integration tests for the translation cache and pipeline
//
// Providers are replaced with in-process stubs that count their calls.

use anyhow::Result;
use async_trait::async_trait;
use call_translator::cache::TranslationCache;
use call_translator::error::{ProviderError, ProviderResult};
use call_translator::language::{Language, LanguageDetector};
use call_translator::pipeline::TranslationPipeline;
use call_translator::providers::{
    OutputFormat, Providers, RecognitionRequest, SpeechRecognizer, SpeechSynthesizer, Transcript,
    Translator,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct EchoRecognizer {
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechRecognizer for EchoRecognizer {
    async fn recognize(&self, request: RecognitionRequest) -> ProviderResult<Option<Transcript>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Transcript {
            text: format!("{} bytes", request.audio.len()),
            confidence: 0.9,
            language: Some(request.language),
        }))
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}

struct BrokenRecognizer;

#[async_trait]
impl SpeechRecognizer for BrokenRecognizer {
    async fn recognize(&self, _request: RecognitionRequest) -> ProviderResult<Option<Transcript>> {
        Err(ProviderError::Api {
            status: 500,
            message: "backend error".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

#[derive(Default)]
struct UppercaseTranslator {
    calls: AtomicUsize,
}

#[async_trait]
impl Translator for UppercaseTranslator {
    async fn translate(&self, text: &str, _source: Language, target: Language) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{}] {}", target, text.to_uppercase()))
    }

    fn name(&self) -> &'static str {
        "uppercase"
    }
}

struct BrokenTranslator;

#[async_trait]
impl Translator for BrokenTranslator {
    async fn translate(&self, _text: &str, _source: Language, _target: Language) -> ProviderResult<String> {
        Err(ProviderError::InvalidResponse("no translations".to_string()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

struct ToneSynthesizer;

#[async_trait]
impl SpeechSynthesizer for ToneSynthesizer {
    async fn synthesize(&self, text: &str, _language: Language, format: OutputFormat) -> ProviderResult<Vec<u8>> {
        match format {
            OutputFormat::Mulaw8k => Ok(vec![0x7F; text.len()]),
            OutputFormat::Mp3 => Ok(b"ID3".to_vec()),
        }
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}

struct SilentSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SilentSynthesizer {
    async fn synthesize(&self, _text: &str, _language: Language, _format: OutputFormat) -> ProviderResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

fn pipeline(
    recognizer: Arc<dyn SpeechRecognizer>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
) -> TranslationPipeline {
    TranslationPipeline::new(
        Providers::new(recognizer, translator, synthesizer),
        10,
        LanguageDetector::default(),
    )
}

#[test]
fn test_cache_hits_and_misses() {
    let cache = TranslationCache::new(10);

    assert!(cache.get("namaste", Language::Hindi, Language::English).is_none());
    cache.insert("namaste", Language::Hindi, Language::English, "hello".to_string());

    assert_eq!(
        cache.get("  namaste ", Language::Hindi, Language::English).as_deref(),
        Some("hello")
    );
    // Direction is part of the key
    assert!(cache.get("namaste", Language::English, Language::Hindi).is_none());

    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.clears, 0);
}

#[test]
fn test_cache_clears_when_full() {
    let cache = TranslationCache::new(2);
    cache.insert("a", Language::Hindi, Language::English, "1".to_string());
    cache.insert("b", Language::Hindi, Language::English, "2".to_string());

    // Overwriting an existing key never clears
    cache.insert("b", Language::Hindi, Language::English, "two".to_string());
    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().clears, 0);

    cache.insert("c", Language::Hindi, Language::English, "3".to_string());
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.stats().clears, 1);
    assert!(cache.get("a", Language::Hindi, Language::English).is_none());
    assert_eq!(cache.get("c", Language::Hindi, Language::English).as_deref(), Some("3"));
}

#[test]
fn test_zero_capacity_cache_stores_nothing() {
    let cache = TranslationCache::new(0);
    cache.insert("a", Language::Hindi, Language::English, "1".to_string());
    assert!(cache.is_empty());
    assert_eq!(cache.stats().capacity, 0);
}

#[tokio::test]
async fn test_translate_uses_cache() -> Result<()> {
    let translator = Arc::new(UppercaseTranslator::default());
    let pipeline = pipeline(
        Arc::new(EchoRecognizer::default()),
        translator.clone(),
        Arc::new(ToneSynthesizer),
    );

    let first = pipeline.translate("hello", Language::English, Language::Hindi).await;
    let second = pipeline.translate("hello", Language::English, Language::Hindi).await;

    assert_eq!(first, "[hi] HELLO");
    assert_eq!(second, first);
    assert_eq!(translator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.cache_stats().hits, 1);

    Ok(())
}

#[tokio::test]
async fn test_translate_passthrough() -> Result<()> {
    let translator = Arc::new(UppercaseTranslator::default());
    let pipeline = pipeline(
        Arc::new(EchoRecognizer::default()),
        translator.clone(),
        Arc::new(ToneSynthesizer),
    );

    assert_eq!(pipeline.translate("hello", Language::English, Language::English).await, "hello");
    assert_eq!(pipeline.translate("  ", Language::English, Language::Hindi).await, "  ");
    assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.cache_stats().misses, 0);

    Ok(())
}

#[tokio::test]
async fn test_translate_failure_returns_original() -> Result<()> {
    let pipeline = pipeline(
        Arc::new(EchoRecognizer::default()),
        Arc::new(BrokenTranslator),
        Arc::new(ToneSynthesizer),
    );

    let text = pipeline.translate("namaste", Language::Hindi, Language::English).await;
    assert_eq!(text, "namaste");
    assert_eq!(pipeline.cache_stats().entries, 0, "failures are not cached");

    Ok(())
}

#[tokio::test]
async fn test_transcribe_mulaw_chunk() -> Result<()> {
    let recognizer = Arc::new(EchoRecognizer::default());
    let pipeline = pipeline(
        recognizer.clone(),
        Arc::new(UppercaseTranslator::default()),
        Arc::new(ToneSynthesizer),
    );

    let transcript = pipeline
        .transcribe(vec![0xFF; 8000], Language::Hindi, &[Language::English])
        .await
        .expect("transcript");
    assert_eq!(transcript.text, "8000 bytes");
    assert_eq!(transcript.language, Some(Language::Hindi));

    // Empty audio never reaches the provider
    assert!(pipeline.transcribe(Vec::new(), Language::Hindi, &[]).await.is_none());
    assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_recognizer_failure_is_no_transcript() -> Result<()> {
    let pipeline = pipeline(
        Arc::new(BrokenRecognizer),
        Arc::new(UppercaseTranslator::default()),
        Arc::new(ToneSynthesizer),
    );

    assert!(pipeline
        .transcribe(vec![0xFF; 160], Language::English, &[])
        .await
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_process_utterance_synthesizes_target_language() -> Result<()> {
    let pipeline = pipeline(
        Arc::new(EchoRecognizer::default()),
        Arc::new(UppercaseTranslator::default()),
        Arc::new(ToneSynthesizer),
    );

    let outcome = pipeline
        .process_utterance("namaste", Language::Hindi, Language::English, OutputFormat::Mulaw8k)
        .await;

    assert_eq!(outcome.original, "namaste");
    assert_eq!(outcome.translated, "[en] NAMASTE");
    assert_eq!(outcome.source, Language::Hindi);
    assert_eq!(outcome.target, Language::English);
    assert!(outcome.has_audio());
    assert_eq!(outcome.audio.as_ref().map(Vec::len), Some(outcome.translated.len()));

    let json = serde_json::to_value(&outcome)?;
    assert!(json.get("audio").is_none());
    assert_eq!(json["source"], "hi");

    Ok(())
}

#[tokio::test]
async fn test_empty_or_failed_synthesis_is_no_audio() -> Result<()> {
    let silent = pipeline(
        Arc::new(EchoRecognizer::default()),
        Arc::new(UppercaseTranslator::default()),
        Arc::new(SilentSynthesizer),
    );
    let outcome = silent
        .process_utterance("hello", Language::English, Language::Hindi, OutputFormat::Mp3)
        .await;
    assert!(!outcome.has_audio());
    assert!(outcome.audio.is_none());

    let offline = TranslationPipeline::new(Providers::offline(), 10, LanguageDetector::default());
    let outcome = offline
        .process_utterance("namaste", Language::Hindi, Language::English, OutputFormat::Mp3)
        .await;
    assert_eq!(outcome.translated, "hello");
    assert!(outcome.audio.is_none());

    Ok(())
}

#[tokio::test]
async fn test_providers_describe() {
    let providers = Providers::offline();
    assert_eq!(
        providers.describe(),
        "recognizer=silent, translator=phrase-table, synthesizer=unavailable"
    );
}

#[test]
fn test_detect_spoken_prefers_confident_evidence() {
    let pipeline = TranslationPipeline::new(Providers::offline(), 10, LanguageDetector::new(0.6));

    // English function words outweigh the recognizer's report when confident
    assert_eq!(
        pipeline.detect_spoken("How are you today", Some(0.9), Some(Language::Hindi)),
        Language::English
    );
    // Romanised Hindi beats a recognizer that assumed English
    assert_eq!(
        pipeline.detect_spoken("namaste kaise ho", Some(0.9), Some(Language::English)),
        Language::Hindi
    );
    // Unmarked names fall back to the recognizer, then English
    assert_eq!(
        pipeline.detect_spoken("Ravi Kumar", Some(0.9), Some(Language::Hindi)),
        Language::Hindi
    );
    assert_eq!(pipeline.detect_spoken("Ravi Kumar", None, None), Language::English);
    // Low confidence skips the word ratio
    assert_eq!(
        pipeline.detect_spoken("the and is", Some(0.2), Some(Language::Hindi)),
        Language::Hindi
    );
}
