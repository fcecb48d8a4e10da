//! Telephony provider integration: TwiML responses, webhook payloads, the
//! media stream protocol and the REST client.

pub mod client;
pub mod media;
pub mod twiml;
pub mod webhook;

pub use client::{recording_media_url, CreatedCall, TelephonyClient};
pub use media::{parse_event, OutgoingMessage, StreamEvent};
pub use twiml::{Dial, Gather, Record, Stream, TwimlResponse};
pub use webhook::{
    is_terminal_status, normalize_number, CallWebhook, ConferenceWebhook, GatherCallback,
    RecordingCallback, TranscriptionCallback,
};
