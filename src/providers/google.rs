use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    untranslated, AudioEncoding, OutputFormat, RecognitionRequest, SpeechRecognizer,
    SpeechSynthesizer, Transcript, Translator,
};
use crate::audio::codec::{strip_wav_header, TELEPHONY_SAMPLE_RATE};
use crate::config::{GoogleConfig, TranslationConfig};
use crate::error::{ProviderError, ProviderResult};
use crate::language::Language;

/// Header carrying the API key on every request
const API_KEY_HEADER: &str = "x-goog-api-key";

// ===========================================================================
// Wire types
// ===========================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    alternative_language_codes: Vec<String>,
    model: String,
    use_enhanced: bool,
    enable_automatic_punctuation: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
    #[serde(default)]
    language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'static str,
    target: &'static str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslatedText {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<TranslatedText>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: &'static str,
    name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample_rate_hertz: Option<u32>,
    speaking_rate: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

// ===========================================================================
// Client
// ===========================================================================

/// Google Cloud Speech-to-Text, Translation v2 and Text-to-Speech over REST
/// with API key authentication
pub struct GoogleCloud {
    client: reqwest::Client,
    api_key: String,
    speech_url: String,
    translate_url: String,
    tts_url: String,
    speech_model: String,
    use_enhanced: bool,
    speaking_rate: f32,
}

impl GoogleCloud {
    pub fn new(google: &GoogleConfig, translation: &TranslationConfig) -> ProviderResult<Self> {
        let api_key = google
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::Unavailable("Google API key not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(google.request_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            client,
            api_key,
            speech_url: google.speech_url.clone(),
            translate_url: google.translate_url.clone(),
            tts_url: google.tts_url.clone(),
            speech_model: google.speech_model.clone(),
            use_enhanced: google.use_enhanced,
            speaking_rate: translation.speaking_rate,
        })
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(text);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SpeechRecognizer for GoogleCloud {
    async fn recognize(&self, request: RecognitionRequest) -> ProviderResult<Option<Transcript>> {
        let encoding = match request.encoding {
            AudioEncoding::Mulaw => "MULAW",
            AudioEncoding::Linear16 => "LINEAR16",
        };

        debug!(
            "Recognizing {:.1}KB of {} audio ({})",
            request.audio.len() as f64 / 1024.0,
            encoding,
            request.language.locale()
        );

        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding,
                sample_rate_hertz: request.sample_rate,
                language_code: request.language.locale().to_string(),
                alternative_language_codes: request
                    .alternative_languages
                    .iter()
                    .filter(|l| **l != request.language)
                    .map(|l| l.locale().to_string())
                    .collect(),
                model: self.speech_model.clone(),
                use_enhanced: self.use_enhanced,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(&request.audio),
            },
        };

        let response: RecognizeResponse = self.post(&self.speech_url, &body).await?;

        let transcript = response.results.into_iter().find_map(|result| {
            let language = result
                .language_code
                .as_deref()
                .and_then(|code| code.parse::<Language>().ok());
            result
                .alternatives
                .into_iter()
                .next()
                .filter(|alt| !alt.transcript.trim().is_empty())
                .map(|alt| Transcript {
                    text: alt.transcript.trim().to_string(),
                    confidence: alt.confidence,
                    language,
                })
        });

        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "google-speech"
    }
}

#[async_trait]
impl Translator for GoogleCloud {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> ProviderResult<String> {
        if let Some(unchanged) = untranslated(text, source, target) {
            return Ok(unchanged);
        }

        let body = TranslateRequest {
            q: text,
            source: source.code(),
            target: target.code(),
            format: "text",
        };

        let response: TranslateResponse = self.post(&self.translate_url, &body).await?;

        response
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::InvalidResponse("no translations returned".to_string()))
    }

    fn name(&self) -> &'static str {
        "google-translate"
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleCloud {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        format: OutputFormat,
    ) -> ProviderResult<Vec<u8>> {
        let audio_config = match format {
            OutputFormat::Mulaw8k => AudioConfig {
                audio_encoding: "MULAW",
                sample_rate_hertz: Some(TELEPHONY_SAMPLE_RATE),
                speaking_rate: self.speaking_rate,
            },
            OutputFormat::Mp3 => AudioConfig {
                audio_encoding: "MP3",
                sample_rate_hertz: None,
                speaking_rate: self.speaking_rate,
            },
        };

        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: language.locale(),
                name: language.voice(),
            },
            audio_config,
        };

        let response: SynthesizeResponse = self.post(&self.tts_url, &body).await?;
        if response.audio_content.is_empty() {
            warn!("TTS returned no audio for {} text", language);
            return Err(ProviderError::InvalidResponse("empty audioContent".to_string()));
        }

        let audio = base64::engine::general_purpose::STANDARD.decode(&response.audio_content)?;

        Ok(match format {
            // MULAW output arrives wrapped in a WAV header
            OutputFormat::Mulaw8k => strip_wav_header(&audio).to_vec(),
            OutputFormat::Mp3 => audio,
        })
    }

    fn name(&self) -> &'static str {
        "google-tts"
    }
}
