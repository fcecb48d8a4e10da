//! Media stream wire protocol.
//!
//! Incoming frames are JSON objects tagged by `event`. Audio is base64 µ-law
//! at 8 kHz. Unknown events deserialize to [`StreamEvent::Unknown`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::audio::codec::encode_payload;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StreamEvent {
    Connected(ConnectedEvent),
    Start(StartEvent),
    Media(MediaEvent),
    Mark(MarkEvent),
    Stop(StopEvent),
    #[serde(other)]
    Unknown,
}

pub fn parse_event(text: &str) -> Result<StreamEvent, serde_json::Error> {
    serde_json::from_str(text)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectedEvent {
    pub protocol: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartPayload {
    pub account_sid: Option<String>,
    pub stream_sid: String,
    pub call_sid: String,
    pub tracks: Vec<String>,
    pub media_format: Option<MediaFormat>,
    pub custom_parameters: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEvent {
    #[serde(default)]
    pub sequence_number: Option<String>,
    #[serde(default)]
    pub stream_sid: Option<String>,
    pub start: StartPayload,
}

impl StartEvent {
    /// Stream id from the payload, falling back to the envelope
    pub fn stream_sid(&self) -> &str {
        if self.start.stream_sid.is_empty() {
            self.stream_sid.as_deref().unwrap_or("")
        } else {
            &self.start.stream_sid
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MediaPayload {
    pub track: Option<String>,
    pub chunk: Option<String>,
    pub timestamp: Option<String>,
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEvent {
    #[serde(default)]
    pub sequence_number: Option<String>,
    #[serde(default)]
    pub stream_sid: Option<String>,
    pub media: MediaPayload,
}

impl MediaEvent {
    /// Milliseconds since the stream started
    pub fn timestamp_ms(&self) -> u64 {
        self.media
            .timestamp
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(0)
    }

    /// Audio sent by the telephony provider (as opposed to our own playback)
    pub fn is_inbound(&self) -> bool {
        self.media
            .track
            .as_deref()
            .map(|t| t.starts_with("inbound"))
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MarkPayload {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkEvent {
    #[serde(default)]
    pub stream_sid: Option<String>,
    #[serde(default)]
    pub mark: MarkPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StopPayload {
    pub account_sid: Option<String>,
    pub call_sid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopEvent {
    #[serde(default)]
    pub stream_sid: Option<String>,
    #[serde(default)]
    pub stop: StopPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingMedia {
    pub payload: String,
}

/// Messages sent back on a bidirectional stream
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutgoingMessage {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutgoingMedia,
    },
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkPayload,
    },
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

impl OutgoingMessage {
    pub fn media(stream_sid: impl Into<String>, mulaw: &[u8]) -> Self {
        OutgoingMessage::Media {
            stream_sid: stream_sid.into(),
            media: OutgoingMedia {
                payload: encode_payload(mulaw),
            },
        }
    }

    pub fn mark(stream_sid: impl Into<String>, name: impl Into<String>) -> Self {
        OutgoingMessage::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkPayload { name: name.into() },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        OutgoingMessage::Clear {
            stream_sid: stream_sid.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
