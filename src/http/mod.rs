//! HTTP server for telephony webhooks and media streams
//!
//! Webhooks (TwiML responses):
//! - POST /twilio-webhook - Incoming call, answered per call mode
//! - POST /receiver-connected/:call_sid - Forwarded party answered
//! - POST /join-conference, /conference-status - Conference legs
//! - POST /call-status, /call-ended - Call lifecycle
//! - POST /recording-callback, /recording-status, /transcription-webhook, /gather-webhook
//!
//! Media streams (WebSocket):
//! - GET /media-stream - Single bidirectional stream
//! - GET /media-stream/:call_sid/:participant - One leg of a forwarded call
//!
//! JSON API:
//! - GET / and GET /health - Service description and health
//! - GET /calls, /calls/:call_sid/status, /calls/:call_sid/transcript
//! - POST /translate-text, /make-call
//! - GET /audio/:clip_id - Synthesized clips for `<Play>`

mod handlers;
mod media_stream;
mod prompts;
mod routes;
mod state;
mod webhooks;

pub use handlers::ErrorResponse;
pub use media_stream::{StreamControl, StreamHandler};
pub use prompts::Prompt;
pub use routes::create_router;
pub use state::AppState;
