use super::state::AppState;
use crate::cache::CacheStats;
use crate::error::ProviderError;
use crate::language::Language;
use crate::providers::OutputFormat;
use crate::session::{CallRecord, StreamStats, TranscriptEntry};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub mode: String,
    pub google_available: bool,
    pub providers: String,
    pub active_streams: usize,
    pub active_calls: usize,
    pub cache: CacheStats,
    pub uptime_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct CallStatusResponse {
    pub call: CallRecord,
    pub streams: Vec<StreamStats>,
    pub duration_secs: f64,
}

#[derive(Debug, Deserialize)]
pub struct TranslateTextRequest {
    pub text: String,

    /// Detected from the text when omitted
    pub source: Option<Language>,

    /// Defaults to the other language
    pub target: Option<Language>,

    /// Also synthesize an MP3 clip served under /audio
    #[serde(default)]
    pub synthesize: bool,
}

#[derive(Debug, Serialize)]
pub struct TranslateTextResponse {
    pub original: String,
    pub translated: String,
    pub source: Language,
    pub target: Language,
    pub audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MakeCallRequest {
    pub to: String,

    /// Defaults to the configured caller ID
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MakeCallResponse {
    pub call_sid: String,
    pub status: String,
    pub message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Service
// ============================================================================

/// GET /
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;
    Json(serde_json::json!({
        "service": config.service.name,
        "description": format!(
            "Phone call translator between {} and {}",
            config.translation.primary_language.locale(),
            config.translation.secondary_language.locale()
        ),
        "mode": config.telephony.mode.as_str(),
        "webhook": state.http_url("/twilio-webhook"),
        "media_stream": state.ws_url("/media-stream"),
    }))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = chrono::Utc::now() - state.started_at;

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: state.config.service.name.clone(),
        mode: state.config.telephony.mode.as_str().to_string(),
        google_available: state.config.google_available(),
        providers: state.pipeline.providers().describe(),
        active_streams: state.registry.stream_count().await,
        active_calls: state.registry.call_count().await,
        cache: state.pipeline.cache_stats(),
        uptime_secs: uptime.num_seconds(),
    })
}

// ============================================================================
// Calls
// ============================================================================

/// GET /calls
pub async fn list_calls(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.registry.list_calls().await)
}

/// GET /calls/:call_sid/status
pub async fn get_call_status(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
) -> impl IntoResponse {
    match state.registry.get_call(&call_sid).await {
        Some(call) => {
            let streams = state.registry.streams_for_call(&call_sid).await;
            let duration_secs = call.duration_secs();
            (
                StatusCode::OK,
                Json(CallStatusResponse {
                    call,
                    streams,
                    duration_secs,
                }),
            )
                .into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Call {} not found", call_sid)),
    }
}

/// GET /calls/:call_sid/transcript
pub async fn get_call_transcript(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
) -> impl IntoResponse {
    match state.registry.get_call(&call_sid).await {
        Some(call) => {
            let transcript: Vec<TranscriptEntry> = call.transcript;
            (StatusCode::OK, Json(transcript)).into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Call {} not found", call_sid)),
    }
}

/// POST /make-call
/// Place an outbound call answered by this service's incoming webhook
pub async fn make_call(
    State(state): State<AppState>,
    Json(req): Json<MakeCallRequest>,
) -> impl IntoResponse {
    let from = match req
        .from
        .clone()
        .or_else(|| state.config.telephony.caller_id.clone())
    {
        Some(from) if !from.trim().is_empty() => from,
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "No caller ID: pass `from` or configure telephony.caller_id",
            )
        }
    };

    info!("Placing outbound call to {}", req.to);

    match state
        .telephony
        .create_call(&req.to, &from, &state.http_url("/twilio-webhook"))
        .await
    {
        Ok(call) => (
            StatusCode::OK,
            Json(MakeCallResponse {
                call_sid: call.sid.clone(),
                status: call.status.unwrap_or_else(|| "queued".to_string()),
                message: format!("Calling {}", req.to),
            }),
        )
            .into_response(),
        Err(ProviderError::Unavailable(message)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, message)
        }
        Err(e) => {
            error!("Failed to create call: {}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("Failed to create call: {}", e))
        }
    }
}

// ============================================================================
// Translation
// ============================================================================

/// POST /translate-text
pub async fn translate_text(
    State(state): State<AppState>,
    Json(req): Json<TranslateTextRequest>,
) -> impl IntoResponse {
    let text = req.text.trim();
    if text.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "text must not be empty");
    }

    let source = req.source.unwrap_or_else(|| state.pipeline.detect(text));
    let target = req.target.unwrap_or_else(|| source.other());

    let (translated, audio_url) = if req.synthesize {
        let outcome = state
            .pipeline
            .process_utterance(text, source, target, OutputFormat::Mp3)
            .await;
        let url = outcome.audio.map(|audio| {
            let id = state.clips.insert_mp3(audio);
            state.http_url(&format!("/audio/{}", id))
        });
        (outcome.translated, url)
    } else {
        (state.pipeline.translate(text, source, target).await, None)
    };

    (
        StatusCode::OK,
        Json(TranslateTextResponse {
            original: text.to_string(),
            translated,
            source,
            target,
            audio_url,
        }),
    )
        .into_response()
}

/// GET /audio/:clip_id
pub async fn serve_clip(
    State(state): State<AppState>,
    Path(clip_id): Path<String>,
) -> impl IntoResponse {
    match state.clips.get(&clip_id) {
        Some(clip) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, clip.content_type)],
            clip.data,
        )
            .into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("Clip {} not found", clip_id)),
    }
}
