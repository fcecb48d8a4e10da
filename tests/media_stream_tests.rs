// Integration tests for media stream protocol handling
//
// The handler is driven with provider JSON frames directly; recognition and
// synthesis are in-process stubs.

use anyhow::{bail, Result};
use async_trait::async_trait;
use call_translator::audio::codec::{encode_mulaw, encode_payload};
use call_translator::config::{CallMode, Config};
use call_translator::error::ProviderResult;
use call_translator::http::{AppState, StreamControl, StreamHandler};
use call_translator::language::Language;
use call_translator::providers::{
    OutputFormat, Providers, RecognitionRequest, SpeechRecognizer, SpeechSynthesizer, Transcript,
    Translator,
};
use call_translator::session::{CallRecord, OutboundAudio, Participant};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Replies with queued transcripts and remembers the requested languages
struct ScriptedRecognizer {
    replies: Mutex<VecDeque<&'static str>>,
    heard: Mutex<Vec<Language>>,
}

impl ScriptedRecognizer {
    fn new(replies: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            heard: Mutex::default(),
        })
    }

    fn heard(&self) -> Vec<Language> {
        self.heard.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(&self, request: RecognitionRequest) -> ProviderResult<Option<Transcript>> {
        self.heard.lock().unwrap().push(request.language);
        Ok(self.replies.lock().unwrap().pop_front().map(|text| Transcript {
            text: text.to_string(),
            confidence: 0.9,
            language: Some(request.language),
        }))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct TaggingTranslator;

#[async_trait]
impl Translator for TaggingTranslator {
    async fn translate(&self, text: &str, _source: Language, target: Language) -> ProviderResult<String> {
        Ok(format!("[{}] {}", target, text))
    }

    fn name(&self) -> &'static str {
        "tagging"
    }
}

struct ToneSynthesizer;

#[async_trait]
impl SpeechSynthesizer for ToneSynthesizer {
    async fn synthesize(&self, _text: &str, _language: Language, _format: OutputFormat) -> ProviderResult<Vec<u8>> {
        Ok(vec![0x7F; 8])
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}

fn state(recognizer: Arc<ScriptedRecognizer>) -> Result<AppState> {
    let mut config = Config::default();
    config.service.public_domain = "test.example".to_string();
    // One loud frame fills the buffer
    config.translation.buffer_bytes = 160;
    config.translation.min_utterance_bytes = 80;
    config.translation.min_interval_ms = 0;

    let providers = Providers::new(recognizer, Arc::new(TaggingTranslator), Arc::new(ToneSynthesizer));
    AppState::new(config, providers)
}

fn start(stream_sid: &str, call_sid: &str) -> String {
    serde_json::json!({
        "event": "start",
        "streamSid": stream_sid,
        "start": {
            "streamSid": stream_sid,
            "callSid": call_sid,
            "tracks": ["inbound"],
            "mediaFormat": {"encoding": "audio/x-mulaw", "sampleRate": 8000, "channels": 1}
        }
    })
    .to_string()
}

fn loud_media(stream_sid: &str) -> String {
    serde_json::json!({
        "event": "media",
        "streamSid": stream_sid,
        "media": {"track": "inbound", "payload": encode_payload(&encode_mulaw(&[8000; 160]))}
    })
    .to_string()
}

fn mark(stream_sid: &str, name: &str) -> String {
    serde_json::json!({"event": "mark", "streamSid": stream_sid, "mark": {"name": name}}).to_string()
}

fn stop(stream_sid: &str, call_sid: &str) -> String {
    serde_json::json!({"event": "stop", "streamSid": stream_sid, "stop": {"callSid": call_sid}})
        .to_string()
}

fn started(control: StreamControl) -> Result<mpsc::Receiver<OutboundAudio>> {
    match control {
        StreamControl::Started { outbox, .. } => Ok(outbox),
        other => bail!("expected start, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_registers_unknown_call() -> Result<()> {
    let state = state(ScriptedRecognizer::new(&[]))?;
    let mut handler = StreamHandler::single(state.clone());

    match handler.handle_text(&start("MZ1", "CA1")).await {
        StreamControl::Started { stream_sid, .. } => assert_eq!(stream_sid, "MZ1"),
        other => bail!("expected start, got {:?}", other),
    }

    assert_eq!(handler.stream_sid(), Some("MZ1"));
    let call = state.registry.get_call("CA1").await.expect("call");
    assert_eq!(call.status, "in-progress");
    assert_eq!(call.mode, CallMode::Stream);
    assert_eq!(state.registry.stream_count().await, 1);

    Ok(())
}

#[tokio::test]
async fn test_frames_before_start_or_malformed_are_ignored() -> Result<()> {
    let state = state(ScriptedRecognizer::new(&["namaste"]))?;
    let mut handler = StreamHandler::single(state.clone());

    assert!(matches!(handler.handle_text("not json").await, StreamControl::Continue));
    assert!(matches!(handler.handle_text(&loud_media("MZ1")).await, StreamControl::Continue));
    assert!(matches!(handler.handle_text(&mark("MZ1", "x")).await, StreamControl::Continue));
    handler.flush().await;

    assert_eq!(state.registry.stream_count().await, 0);
    assert_eq!(state.registry.call_count().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_second_start_on_socket_is_ignored() -> Result<()> {
    let state = state(ScriptedRecognizer::new(&[]))?;
    let mut handler = StreamHandler::single(state.clone());

    let _outbox = started(handler.handle_text(&start("MZ1", "CA1")).await)?;
    assert!(matches!(
        handler.handle_text(&start("MZ2", "CA1")).await,
        StreamControl::Continue
    ));

    assert_eq!(handler.stream_sid(), Some("MZ1"));
    assert_eq!(state.registry.stream_count().await, 1);
    assert!(state.registry.get_stream("MZ2").await.is_none());

    handler.close().await;
    assert_eq!(state.registry.stream_count().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_stop_then_close_ends_call() -> Result<()> {
    let state = state(ScriptedRecognizer::new(&[]))?;
    let mut handler = StreamHandler::single(state.clone());

    let _outbox = started(handler.handle_text(&start("MZ1", "CA1")).await)?;
    assert!(matches!(
        handler.handle_text(&stop("MZ1", "CA1")).await,
        StreamControl::Stop
    ));
    handler.close().await;

    assert!(state.registry.get_stream("MZ1").await.is_none());
    assert!(state.registry.get_call("CA1").await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_caller_speech_plays_on_receiver_leg() -> Result<()> {
    let recognizer = ScriptedRecognizer::new(&["namaste kaise ho"]);
    let state = state(recognizer.clone())?;
    state
        .registry
        .register_call(CallRecord::new("CA1", "+911234", "+15550100", CallMode::Forward, Language::Hindi))
        .await;

    let mut caller = StreamHandler::leg(state.clone(), "CA1", Participant::Caller);
    let mut receiver = StreamHandler::leg(state.clone(), "CA1", Participant::Receiver);
    let mut caller_out = started(caller.handle_text(&start("MZ-caller", "CA1")).await)?;
    let mut receiver_out = started(receiver.handle_text(&start("MZ-receiver", "CA1")).await)?;

    caller.handle_text(&loud_media("MZ-caller")).await;
    caller.flush().await;

    assert_eq!(recognizer.heard(), vec![Language::Hindi]);
    match receiver_out.try_recv()? {
        OutboundAudio::Clip { audio, mark } => {
            assert_eq!(audio, vec![0x7F; 8]);
            assert!(mark.is_some_and(|m| m.starts_with("caller-")));
        }
        other => bail!("expected clip, got {:?}", other),
    }
    assert!(caller_out.try_recv().is_err(), "speaker never hears its own translation");

    let call = state.registry.get_call("CA1").await.expect("call");
    assert_eq!(call.transcript.len(), 1);
    assert_eq!(call.transcript[0].participant, Participant::Caller);
    assert_eq!(call.transcript[0].source, Language::Hindi);
    assert_eq!(call.transcript[0].translated, "[en] namaste kaise ho");

    // The call outlives one leg
    caller.close().await;
    assert!(state.registry.get_call("CA1").await.is_some());
    receiver.close().await;
    assert!(state.registry.get_call("CA1").await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_single_stream_alternates_and_acknowledges_playback() -> Result<()> {
    let recognizer = ScriptedRecognizer::new(&["namaste kaise ho", "How are you today"]);
    let state = state(recognizer.clone())?;
    let mut handler = StreamHandler::single(state.clone());
    let mut outbox = started(handler.handle_text(&start("MZ1", "CA1")).await)?;

    handler.handle_text(&loud_media("MZ1")).await;
    handler.flush().await;
    handler.handle_text(&loud_media("MZ1")).await;
    handler.flush().await;

    assert_eq!(recognizer.heard(), vec![Language::Hindi, Language::English]);

    let call = state.registry.get_call("CA1").await.expect("call");
    let sources: Vec<Language> = call.transcript.iter().map(|t| t.source).collect();
    assert_eq!(sources, vec![Language::Hindi, Language::English]);

    // Without a peer leg the translation plays back on the same stream
    let first = match outbox.try_recv()? {
        OutboundAudio::Clip { mark: Some(mark), .. } => mark,
        other => bail!("expected marked clip, got {:?}", other),
    };
    assert!(first.starts_with("single-"));

    let session = state.registry.get_stream("MZ1").await.expect("stream");
    assert_eq!(session.lock().await.pending_playback(), 2);
    handler.handle_text(&mark("MZ1", &first)).await;
    assert_eq!(session.lock().await.pending_playback(), 1);

    Ok(())
}
