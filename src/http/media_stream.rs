use super::handlers::ErrorResponse;
use super::state::AppState;
use crate::audio::codec::decode_payload;
use crate::providers::OutputFormat;
use crate::session::{
    CallRecord, CallSession, OutboundAudio, Participant, SharedSession, TranscriptEntry,
};
use crate::telephony::media::{OutgoingMessage, StartEvent};
use crate::telephony::{parse_event, StreamEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Which leg a socket was opened for
#[derive(Debug, Clone)]
struct StreamRoute {
    call_sid: Option<String>,
    participant: Participant,
}

/// What the socket loop should do after an event
#[derive(Debug)]
pub enum StreamControl {
    Continue,
    /// The stream started; audio for the provider arrives on `outbox`
    Started {
        stream_sid: String,
        outbox: mpsc::Receiver<OutboundAudio>,
    },
    Stop,
}

// ============================================================================
// Upgrades
// ============================================================================

/// GET /media-stream
/// Single bidirectional stream carrying both parties
pub async fn media_stream(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("Media stream connection requested");
    let handler = StreamHandler::single(state.clone());
    ws.on_upgrade(move |socket| handle_stream(socket, state, handler))
}

/// GET /media-stream/:call_sid/:participant
/// One leg of a forwarded call
pub async fn media_stream_leg(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path((call_sid, participant)): Path<(String, String)>,
) -> Response {
    let participant = match participant.parse::<Participant>() {
        Ok(Participant::Single) | Err(_) => {
            warn!("Rejecting media stream for unknown leg {:?}", participant);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unknown participant {}", participant),
                }),
            )
                .into_response();
        }
        Ok(p) => p,
    };

    info!("Media stream requested for {} ({})", call_sid, participant);
    let handler = StreamHandler::leg(state.clone(), call_sid, participant);
    ws.on_upgrade(move |socket| handle_stream(socket, state, handler))
}

// ============================================================================
// Socket loop
// ============================================================================

async fn handle_stream(socket: WebSocket, state: AppState, mut handler: StreamHandler) {
    let (sink, mut receiver) = socket.split();

    // The writer needs the stream id, which only arrives with `start`
    let mut sink = Some(sink);
    let mut writer: Option<JoinHandle<()>> = None;

    while let Some(message) = receiver.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                info!("Media stream closed by provider");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("Media stream error: {}", e);
                break;
            }
        };

        match handler.handle_text(&text).await {
            StreamControl::Continue => {}
            StreamControl::Started { stream_sid, outbox } => {
                if let Some(sink) = sink.take() {
                    writer = Some(spawn_writer(&state, stream_sid, sink, outbox));
                }
            }
            StreamControl::Stop => break,
        }
    }

    handler.close().await;

    if let Some(writer) = writer {
        writer.abort();
    }
}

// ============================================================================
// Protocol handling
// ============================================================================

/// Media stream events of one socket, independent of the transport.
///
/// A socket carries exactly one stream: a second `start` is ignored.
pub struct StreamHandler {
    state: AppState,
    route: StreamRoute,
    current: Option<(String, SharedSession)>,
    chunks: Vec<JoinHandle<()>>,
}

impl StreamHandler {
    /// Handler for the single bidirectional stream of a call
    pub fn single(state: AppState) -> Self {
        Self::new(
            state,
            StreamRoute {
                call_sid: None,
                participant: Participant::Single,
            },
        )
    }

    /// Handler for one leg of a forwarded call
    pub fn leg(state: AppState, call_sid: impl Into<String>, participant: Participant) -> Self {
        Self::new(
            state,
            StreamRoute {
                call_sid: Some(call_sid.into()),
                participant,
            },
        )
    }

    fn new(state: AppState, route: StreamRoute) -> Self {
        Self {
            state,
            route,
            current: None,
            chunks: Vec::new(),
        }
    }

    pub fn stream_sid(&self) -> Option<&str> {
        self.current.as_ref().map(|(sid, _)| sid.as_str())
    }

    /// Parse and handle one text frame; malformed frames are skipped
    pub async fn handle_text(&mut self, text: &str) -> StreamControl {
        match parse_event(text) {
            Ok(event) => self.handle_event(event).await,
            Err(e) => {
                warn!("Ignoring malformed stream message: {}", e);
                StreamControl::Continue
            }
        }
    }

    pub async fn handle_event(&mut self, event: StreamEvent) -> StreamControl {
        match event {
            StreamEvent::Connected(connected) => {
                info!(
                    "Media stream connected (protocol {}, version {})",
                    connected.protocol.as_deref().unwrap_or("?"),
                    connected.version.as_deref().unwrap_or("?")
                );
            }
            StreamEvent::Start(start) => return self.start(&start).await,
            StreamEvent::Media(media) => {
                if !media.is_inbound() {
                    return StreamControl::Continue;
                }
                match decode_payload(&media.media.payload) {
                    Ok(audio) => self.media(&audio).await,
                    Err(e) => warn!("Dropping media frame: {:#}", e),
                }
            }
            StreamEvent::Mark(mark) => {
                if let Some((_, session)) = &self.current {
                    session.lock().await.playback_finished(&mark.mark.name);
                }
            }
            StreamEvent::Stop(stop) => {
                info!(
                    "Media stream stopped (call {})",
                    stop.stop.call_sid.as_deref().unwrap_or("unknown")
                );
                return StreamControl::Stop;
            }
            StreamEvent::Unknown => debug!("Ignoring unknown stream event"),
        }
        StreamControl::Continue
    }

    async fn start(&mut self, start: &StartEvent) -> StreamControl {
        let stream_sid = start.stream_sid().to_string();
        if let Some((current, _)) = &self.current {
            warn!(
                "Socket already carries stream {}; ignoring start of {}",
                current, stream_sid
            );
            return StreamControl::Continue;
        }

        let (tx, outbox) = mpsc::channel(self.state.session_config().outbox_capacity);
        let session = open_session(&self.state, &self.route, start, tx).await;
        self.current = Some((stream_sid.clone(), session));

        StreamControl::Started { stream_sid, outbox }
    }

    async fn media(&mut self, audio: &[u8]) {
        let Some((_, session)) = &self.current else {
            debug!("Media before start; ignoring");
            return;
        };

        let chunk = {
            let mut guard = session.lock().await;
            let chunk = guard.push_media(audio);
            if chunk.is_some() {
                guard.begin_processing();
            }
            chunk
        };

        if let Some(chunk) = chunk {
            let state = self.state.clone();
            let session = Arc::clone(session);
            self.chunks.retain(|task| !task.is_finished());
            self.chunks.push(tokio::spawn(async move {
                process_chunk(&state, &session, chunk).await;
                session.lock().await.finish_processing();
            }));
        }
    }

    /// Wait for chunks already handed to the pipeline
    pub async fn flush(&mut self) {
        for task in self.chunks.drain(..) {
            if let Err(e) = task.await {
                warn!("Chunk processing task failed: {}", e);
            }
        }
    }

    /// Unregister the stream; the call ends with its last stream
    pub async fn close(mut self) {
        let Some((stream_sid, _)) = self.current.take() else {
            return;
        };

        match self.state.registry.close_stream(&stream_sid).await {
            Some(call) => info!(
                "Media stream {} removed; call {} ended after {:.1}s",
                stream_sid,
                call.call_sid,
                call.duration_secs()
            ),
            None => info!("Media stream {} removed", stream_sid),
        }
    }
}

async fn open_session(
    state: &AppState,
    route: &StreamRoute,
    start: &StartEvent,
    outbox: mpsc::Sender<OutboundAudio>,
) -> SharedSession {
    let call_sid = route
        .call_sid
        .clone()
        .unwrap_or_else(|| start.start.call_sid.clone());
    let stream_sid = start.stream_sid().to_string();

    let record = match state.registry.get_call(&call_sid).await {
        Some(record) => record,
        None => {
            // Streams may arrive for calls answered elsewhere
            let record = CallRecord::new(
                &call_sid,
                "",
                "",
                state.config.telephony.mode,
                state.config.translation.primary_language,
            );
            state.registry.register_call(record.clone()).await;
            record
        }
    };

    let language = match route.participant {
        Participant::Receiver => record.receiver_language,
        Participant::Caller | Participant::Single => record.caller_language,
    };

    if let Some(format) = &start.start.media_format {
        info!(
            "Stream {} started for {} ({}, {} Hz, {} ch, {})",
            stream_sid, call_sid, format.encoding, format.sample_rate, format.channels,
            route.participant
        );
    } else {
        info!("Stream {} started for {} ({})", stream_sid, call_sid, route.participant);
    }

    state
        .registry
        .update_call_status(&call_sid, "in-progress")
        .await;

    let session = CallSession::new(
        call_sid,
        stream_sid,
        route.participant,
        language,
        state.session_config(),
        outbox,
    );
    state.registry.start_stream(session).await
}

fn spawn_writer(
    state: &AppState,
    stream_sid: String,
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<OutboundAudio>,
) -> JoinHandle<()> {
    let dumper = state.dumper.clone();

    tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            let mut messages = Vec::with_capacity(2);
            match out {
                OutboundAudio::Clip { audio, mark } => {
                    if let Some(dumper) = &dumper {
                        if let Err(e) = dumper.dump_mulaw(&stream_sid, "outbound", &audio) {
                            warn!("Failed to dump outbound audio: {:#}", e);
                        }
                    }
                    messages.push(OutgoingMessage::media(&stream_sid, &audio));
                    if let Some(name) = mark {
                        messages.push(OutgoingMessage::mark(&stream_sid, name));
                    }
                }
                OutboundAudio::Clear => messages.push(OutgoingMessage::clear(&stream_sid)),
            }

            for message in messages {
                let json = match message.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize outgoing message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json)).await {
                    error!("Failed to send on stream {}: {}", stream_sid, e);
                    return;
                }
            }
        }
    })
}

// ============================================================================
// Chunk processing
// ============================================================================

/// Recognize, translate and speak one buffered chunk
async fn process_chunk(state: &AppState, session: &SharedSession, chunk: Vec<u8>) {
    let (call_sid, stream_sid, participant, language) = {
        let guard = session.lock().await;
        (
            guard.call_sid.clone(),
            guard.stream_sid.clone(),
            guard.participant,
            guard.current_language,
        )
    };

    debug!("Processing {} byte chunk on {}", chunk.len(), stream_sid);

    if let Some(dumper) = &state.dumper {
        if let Err(e) = dumper.dump_mulaw(&stream_sid, "inbound", &chunk) {
            warn!("Failed to dump inbound audio: {:#}", e);
        }
    }

    let Some(transcript) = state
        .pipeline
        .transcribe(chunk, language, &[language.other()])
        .await
    else {
        return;
    };

    let accepted = session.lock().await.accept_transcript(
        &transcript.text,
        transcript.confidence,
        Instant::now(),
    );
    if !accepted {
        return;
    }

    let source = state.pipeline.detect_spoken(
        &transcript.text,
        Some(transcript.confidence),
        transcript.language,
    );
    let target = source.other();

    info!(
        "{} on {} said ({}): {:?}",
        participant, call_sid, source, transcript.text
    );

    let outcome = state
        .pipeline
        .process_utterance(&transcript.text, source, target, OutputFormat::Mulaw8k)
        .await;

    info!("Translated ({} -> {}): {:?}", source, target, outcome.translated);

    state
        .registry
        .append_transcript(
            &call_sid,
            TranscriptEntry {
                participant,
                original: outcome.original.clone(),
                translated: outcome.translated.clone(),
                source,
                target,
                confidence: Some(transcript.confidence),
                timestamp: Utc::now(),
            },
        )
        .await;

    if let Some(audio) = outcome.audio.filter(|a| !a.is_empty()) {
        let destination = state
            .registry
            .find_peer(&call_sid, participant)
            .await
            .unwrap_or_else(|| Arc::clone(session));

        let mark = format!("{}-{}", participant, Utc::now().timestamp_millis());
        let queued = destination.lock().await.enqueue_output(OutboundAudio::Clip {
            audio,
            mark: Some(mark),
        });
        if !queued {
            warn!("Translated audio for {} was not queued", call_sid);
        }
    }

    session.lock().await.record_translation();
}
