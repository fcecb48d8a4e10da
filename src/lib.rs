pub mod audio;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod language;
pub mod pipeline;
pub mod providers;
pub mod session;
pub mod telephony;

pub use audio::{AudioDumper, ClipStore, DecodedRecording, VadEvent, VoiceActivityDetector};
pub use cache::{CacheStats, TranslationCache};
pub use config::{CallMode, Config};
pub use error::{ProviderError, ProviderResult};
pub use http::{create_router, AppState};
pub use language::{Language, LanguageDetector};
pub use pipeline::{TranslationOutcome, TranslationPipeline};
pub use providers::{
    OutputFormat, Providers, RecognitionRequest, SpeechRecognizer, SpeechSynthesizer, Transcript,
    Translator,
};
pub use session::{
    CallRecord, CallSession, OutboundAudio, Participant, SessionConfig, SessionRegistry,
    StreamStats, TranscriptEntry,
};
pub use telephony::{OutgoingMessage, StreamEvent, TelephonyClient, TwimlResponse};
