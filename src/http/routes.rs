use super::handlers;
use super::media_stream;
use super::state::AppState;
use super::webhooks;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        // Telephony webhooks (TwiML)
        .route("/twilio-webhook", post(webhooks::incoming_call))
        .route(
            "/receiver-connected/:call_sid",
            post(webhooks::receiver_connected),
        )
        .route("/join-conference", post(webhooks::join_conference))
        .route("/conference-status", post(webhooks::conference_status))
        .route("/call-status", post(webhooks::call_status))
        .route("/call-ended", post(webhooks::call_ended))
        .route("/recording-callback", post(webhooks::recording_result))
        .route("/recording-status", post(webhooks::recording_status))
        .route("/transcription-webhook", post(webhooks::transcription_result))
        .route("/gather-webhook", post(webhooks::gather_result))
        // Media streams
        .route("/media-stream", get(media_stream::media_stream))
        .route(
            "/media-stream/:call_sid/:participant",
            get(media_stream::media_stream_leg),
        )
        // Clips for <Play>
        .route("/audio/:clip_id", get(handlers::serve_clip))
        // Call queries and control
        .route("/calls", get(handlers::list_calls))
        .route("/calls/:call_sid/status", get(handlers::get_call_status))
        .route(
            "/calls/:call_sid/transcript",
            get(handlers::get_call_transcript),
        )
        .route("/translate-text", post(handlers::translate_text))
        .route("/make-call", post(handlers::make_call))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
