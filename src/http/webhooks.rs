use super::prompts::{Prompt, GATHER_HINTS};
use super::state::AppState;
use crate::audio::codec::pcm_to_bytes;
use crate::audio::DecodedRecording;
use crate::config::CallMode;
use crate::language::Language;
use crate::providers::{AudioEncoding, OutputFormat, RecognitionRequest};
use crate::session::{CallRecord, Participant, TranscriptEntry};
use crate::telephony::{
    is_terminal_status, normalize_number, recording_media_url, CallWebhook, ConferenceWebhook,
    Dial, Gather, GatherCallback, Record, RecordingCallback, Stream, TranscriptionCallback,
    TwimlResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Form,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

// ============================================================================
// Incoming call
// ============================================================================

/// POST /twilio-webhook
/// Answer an incoming call according to the configured call mode
pub async fn incoming_call(
    State(state): State<AppState>,
    Form(hook): Form<CallWebhook>,
) -> impl IntoResponse {
    let call_sid = hook.call_sid().to_string();
    let mode = state.config.telephony.mode;
    let caller_language = state.config.translation.primary_language;

    info!(
        "Incoming call {} from {} to {} (mode: {})",
        call_sid,
        hook.from_number(),
        hook.to_number(),
        mode.as_str()
    );

    let forward_to = state.config.telephony.forward_to_number.clone();
    let record = CallRecord::new(
        &call_sid,
        hook.from_number(),
        hook.to_number(),
        mode,
        caller_language,
    )
    .with_forward_to(forward_to);
    state.registry.register_call(record).await;

    match mode {
        CallMode::Stream => stream_call(&state),
        CallMode::Forward => forward_call(&state, &call_sid, &hook),
        CallMode::Conference => conference_call(&state, &call_sid, &hook),
        CallMode::Record => record_call(&state),
        CallMode::Gather => gather_call(&state),
        CallMode::Direct => direct_call(&state, &hook),
    }
}

fn stream_call(state: &AppState) -> TwimlResponse {
    let primary = state.config.translation.primary_language;
    let secondary = state.config.translation.secondary_language;

    TwimlResponse::new()
        .say(primary, Prompt::Greeting.text(primary))
        .say(secondary, Prompt::Greeting.text(secondary))
        .connect_stream(Stream::new(state.ws_url("/media-stream")))
}

/// Forward number, unless missing or equal to the caller
fn forward_target(state: &AppState, hook: &CallWebhook) -> Result<String, Prompt> {
    let number = match state.config.telephony.forward_to_number.as_deref() {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        _ => return Err(Prompt::NotConfigured),
    };

    if normalize_number(&number) == normalize_number(hook.from_number()) {
        return Err(Prompt::SelfForward);
    }

    Ok(number)
}

fn rejected(language: Language, prompt: Prompt) -> TwimlResponse {
    warn!("Rejecting call: {:?}", prompt);
    TwimlResponse::new()
        .say(language, prompt.text(language))
        .hangup()
}

fn caller_id(state: &AppState, hook: &CallWebhook) -> String {
    state
        .config
        .telephony
        .caller_id
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| hook.to_number().to_string())
}

fn forward_call(state: &AppState, call_sid: &str, hook: &CallWebhook) -> TwimlResponse {
    let language = state.config.translation.primary_language;
    let number = match forward_target(state, hook) {
        Ok(number) => number,
        Err(prompt) => return rejected(language, prompt),
    };

    let caller_stream = Stream::new(state.ws_url(&format!("/media-stream/{}/caller", call_sid)))
        .track("inbound_track");

    let dial = Dial::number(number)
        .action(state.http_url("/call-ended"))
        .caller_id(caller_id(state, hook))
        .number_url(state.http_url(&format!("/receiver-connected/{}", call_sid)));

    TwimlResponse::new()
        .say(language, Prompt::Connecting.text(language))
        .start_stream(caller_stream)
        .dial(dial)
}

fn conference_call(state: &AppState, call_sid: &str, hook: &CallWebhook) -> TwimlResponse {
    let language = state.config.translation.primary_language;
    let number = match forward_target(state, hook) {
        Ok(number) => number,
        Err(prompt) => return rejected(language, prompt),
    };

    let conference = format!("conf_{}", call_sid);
    let join_url = state.http_url(&format!("/join-conference?conf={}", conference));
    let from = caller_id(state, hook);

    // Bring the forward number into the same room
    let telephony = state.telephony.clone();
    tokio::spawn(async move {
        match telephony.create_call(&number, &from, &join_url).await {
            Ok(call) => info!("Conference leg {} dialled ({})", call.sid, number),
            Err(e) => error!("Failed to dial conference leg {}: {}", number, e),
        }
    });

    let dial = Dial::conference(&conference).status_callback(
        state.http_url("/conference-status"),
        "start end join leave",
    );

    TwimlResponse::new()
        .say(language, Prompt::ConferenceJoining.text(language))
        .dial(dial)
}

fn record_verb(state: &AppState) -> Record {
    Record::new(state.http_url("/recording-callback"))
        .max_length(10)
        .timeout(5)
        .transcribe(state.http_url("/transcription-webhook"))
}

fn gather_verb(state: &AppState) -> Gather {
    let primary = state.config.translation.primary_language;
    Gather::speech(state.http_url("/gather-webhook"), primary)
        .timeout(20)
        .hints(GATHER_HINTS)
}

fn record_call(state: &AppState) -> TwimlResponse {
    let primary = state.config.translation.primary_language;
    let secondary = state.config.translation.secondary_language;

    TwimlResponse::new()
        .say(primary, Prompt::Greeting.text(primary))
        .say(secondary, Prompt::Greeting.text(secondary))
        .say(primary, Prompt::RecordPrompt.text(primary))
        .record(record_verb(state))
        .say(primary, Prompt::NoSpeech.text(primary))
        .say(primary, Prompt::Goodbye.text(primary))
        .hangup()
}

fn gather_call(state: &AppState) -> TwimlResponse {
    let primary = state.config.translation.primary_language;

    TwimlResponse::new()
        .say(primary, Prompt::GatherPrompt.text(primary))
        .gather(gather_verb(state))
        .say(primary, Prompt::NoSpeech.text(primary))
        .gather(gather_verb(state))
        .say(primary, Prompt::Goodbye.text(primary))
}

fn direct_call(state: &AppState, hook: &CallWebhook) -> TwimlResponse {
    let language = state.config.translation.primary_language;
    match forward_target(state, hook) {
        Ok(number) => TwimlResponse::new()
            .dial(Dial::number(number).caller_id(caller_id(state, hook)).timeout(30)),
        Err(prompt) => rejected(language, prompt),
    }
}

// ============================================================================
// Call legs and lifecycle
// ============================================================================

/// POST /receiver-connected/:call_sid
/// TwiML for the forwarded party once they answer
pub async fn receiver_connected(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
) -> impl IntoResponse {
    info!("Receiver connected for call {}", call_sid);

    let language = state
        .registry
        .get_call(&call_sid)
        .await
        .map(|record| record.receiver_language)
        .unwrap_or(state.config.translation.secondary_language);

    state.registry.update_call_status(&call_sid, "in-progress").await;

    let stream = Stream::new(state.ws_url(&format!("/media-stream/{}/receiver", call_sid)))
        .track("inbound_track");

    TwimlResponse::new()
        .say(language, Prompt::ReceiverConnected.text(language))
        .start_stream(stream)
        .pause(3600)
}

/// POST /join-conference?conf=<name>
pub async fn join_conference(
    State(state): State<AppState>,
    Query(query): Query<ConferenceWebhook>,
) -> impl IntoResponse {
    let language = state.config.translation.secondary_language;

    match query.conference() {
        Some(name) => {
            info!("Outbound leg joining conference {}", name);
            TwimlResponse::new()
                .say(language, Prompt::ConferenceJoined.text(language))
                .dial(Dial::conference(name).end_on_exit(true))
        }
        None => {
            warn!("join-conference called without a conference name");
            TwimlResponse::new()
                .say(language, Prompt::Error.text(language))
                .hangup()
        }
    }
}

/// POST /conference-status
pub async fn conference_status(Form(hook): Form<ConferenceWebhook>) -> impl IntoResponse {
    info!(
        "Conference {} event: {}",
        hook.conference().unwrap_or("unknown"),
        hook.status_callback_event.as_deref().unwrap_or("unknown")
    );
    (StatusCode::OK, Json(json!({ "success": true })))
}

/// POST /call-status
/// Status callback; terminal statuses end the call and its streams
pub async fn call_status(
    State(state): State<AppState>,
    Form(hook): Form<CallWebhook>,
) -> impl IntoResponse {
    let call_sid = hook.call_sid().to_string();
    let status = hook.call_status.clone().unwrap_or_default();

    info!(
        "Call {} status: {} (duration: {}s)",
        call_sid,
        status,
        hook.call_duration.as_deref().unwrap_or("0")
    );

    if is_terminal_status(&status) {
        state.registry.end_call(&call_sid).await;
    } else if !status.is_empty() {
        state.registry.update_call_status(&call_sid, &status).await;
    }

    (StatusCode::OK, "OK")
}

/// POST /call-ended
/// `<Dial action>` callback once the forwarded leg finishes
pub async fn call_ended(
    State(state): State<AppState>,
    Form(hook): Form<CallWebhook>,
) -> impl IntoResponse {
    let call_sid = hook.call_sid().to_string();
    info!(
        "Call {} ended (dial status: {}, duration: {}s)",
        call_sid,
        hook.dial_call_status.as_deref().unwrap_or("unknown"),
        hook.dial_call_duration.as_deref().unwrap_or("0")
    );

    state.registry.end_call(&call_sid).await;

    TwimlResponse::new().hangup()
}

/// POST /recording-status
pub async fn recording_status(Form(hook): Form<RecordingCallback>) -> impl IntoResponse {
    info!(
        "Recording {} for call {}: {}",
        hook.recording_sid.as_deref().unwrap_or("unknown"),
        hook.call_sid.as_deref().unwrap_or("unknown"),
        hook.recording_url.as_deref().unwrap_or("")
    );
    (StatusCode::OK, "OK")
}

// ============================================================================
// Translation replies
// ============================================================================

/// Which verb re-prompts the caller after a reply
#[derive(Debug, Clone, Copy)]
enum Reprompt {
    Record,
    Gather,
}

fn reprompt(state: &AppState, twiml: TwimlResponse, kind: Reprompt) -> TwimlResponse {
    let primary = state.config.translation.primary_language;
    let twiml = twiml.say(primary, Prompt::SayMore.text(primary));

    let twiml = match kind {
        Reprompt::Record => twiml.record(record_verb(state)),
        Reprompt::Gather => twiml.gather(gather_verb(state)),
    };

    twiml
        .say(primary, Prompt::Goodbye.text(primary))
        .hangup()
}

fn no_speech(state: &AppState, kind: Reprompt) -> TwimlResponse {
    let primary = state.config.translation.primary_language;
    let twiml = TwimlResponse::new().say(primary, Prompt::NoSpeech.text(primary));
    let twiml = match kind {
        Reprompt::Record => twiml.record(record_verb(state)),
        Reprompt::Gather => twiml.gather(gather_verb(state)),
    };
    twiml.say(primary, Prompt::Goodbye.text(primary))
}

/// Detect, translate and build the "You said / Translation" reply
async fn translation_reply(
    state: &AppState,
    call_sid: &str,
    text: &str,
    confidence: Option<f32>,
) -> TwimlResponse {
    let source = state.pipeline.detect_spoken(text, confidence, None);
    let target = source.other();

    let outcome = state
        .pipeline
        .process_utterance(text, source, target, OutputFormat::Mp3)
        .await;

    info!(
        "Call {}: {} -> {}: {:?} -> {:?}",
        call_sid, source, target, outcome.original, outcome.translated
    );

    state
        .registry
        .append_transcript(
            call_sid,
            TranscriptEntry {
                participant: Participant::Single,
                original: outcome.original.clone(),
                translated: outcome.translated.clone(),
                source,
                target,
                confidence,
                timestamp: Utc::now(),
            },
        )
        .await;

    let mut twiml = TwimlResponse::new()
        .say(
            source,
            format!("{} {}", Prompt::YouSaid.text(source), outcome.original),
        )
        .pause(1);

    twiml = match &outcome.audio {
        Some(audio) if !audio.is_empty() => {
            let clip_id = state.clips.insert_mp3(audio.clone());
            twiml.play(state.http_url(&format!("/audio/{}", clip_id)))
        }
        _ => twiml.say(
            target,
            format!("{} {}", Prompt::Translation.text(target), outcome.translated),
        ),
    };

    twiml.pause(1)
}

/// POST /gather-webhook
pub async fn gather_result(
    State(state): State<AppState>,
    Form(hook): Form<GatherCallback>,
) -> impl IntoResponse {
    let call_sid = hook.call_sid.clone().unwrap_or_default();
    let speech = hook.speech_result.as_deref().unwrap_or("").trim().to_string();

    info!(
        "Gather result for {}: {:?} (confidence {:.2})",
        call_sid,
        speech,
        hook.confidence()
    );

    if speech.is_empty() {
        return no_speech(&state, Reprompt::Gather);
    }

    let twiml = translation_reply(&state, &call_sid, &speech, Some(hook.confidence())).await;
    reprompt(&state, twiml, Reprompt::Gather)
}

/// POST /transcription-webhook
pub async fn transcription_result(
    State(state): State<AppState>,
    Form(hook): Form<TranscriptionCallback>,
) -> impl IntoResponse {
    let call_sid = hook.call_sid.clone().unwrap_or_default();
    let text = hook
        .transcription_text
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_string();

    info!(
        "Transcription for {} ({}): {:?}",
        call_sid,
        hook.transcription_status.as_deref().unwrap_or("unknown"),
        text
    );

    if text.is_empty() {
        return no_speech(&state, Reprompt::Record);
    }

    let twiml = translation_reply(&state, &call_sid, &text, None).await;
    reprompt(&state, twiml, Reprompt::Record)
}

/// POST /recording-callback
/// Download the recording, recognize it ourselves and reply
pub async fn recording_result(
    State(state): State<AppState>,
    Form(hook): Form<RecordingCallback>,
) -> impl IntoResponse {
    let call_sid = hook.call_sid.clone().unwrap_or_default();

    let url = match hook.recording_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => recording_media_url(url.trim()),
        None => {
            warn!("Recording callback for {} without RecordingUrl", call_sid);
            return no_speech(&state, Reprompt::Record);
        }
    };

    info!(
        "Recording for {} ({}s): {}",
        call_sid,
        hook.recording_duration.as_deref().unwrap_or("?"),
        url
    );

    let bytes = match state.telephony.download_recording(&url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to download recording {}: {}", url, e);
            return no_speech(&state, Reprompt::Record);
        }
    };

    let extension = url.rsplit('.').next().map(|e| e.to_string());
    let recording = match DecodedRecording::decode(bytes, extension.as_deref()) {
        Ok(recording) => recording,
        Err(e) => {
            error!("Failed to decode recording {}: {:#}", url, e);
            return no_speech(&state, Reprompt::Record);
        }
    };

    let primary = state.config.translation.primary_language;
    let secondary = state.config.translation.secondary_language;
    let transcript = state
        .pipeline
        .recognize(RecognitionRequest {
            audio: pcm_to_bytes(&recording.samples),
            encoding: AudioEncoding::Linear16,
            sample_rate: recording.sample_rate,
            language: primary,
            alternative_languages: vec![secondary],
        })
        .await;

    match transcript {
        Some(t) if t.confidence >= state.config.translation.min_confidence => {
            let twiml = translation_reply(&state, &call_sid, &t.text, Some(t.confidence)).await;
            reprompt(&state, twiml, Reprompt::Record)
        }
        Some(t) => {
            info!(
                "Discarding low confidence recording transcript ({:.2}): {:?}",
                t.confidence, t.text
            );
            no_speech(&state, Reprompt::Record)
        }
        None => no_speech(&state, Reprompt::Record),
    }
}
