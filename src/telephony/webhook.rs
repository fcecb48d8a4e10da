//! Form payloads posted by the telephony provider.
//!
//! All fields are optional: the provider omits parameters that do not apply
//! to an event and handlers must answer with TwiML regardless.

use serde::Deserialize;

/// Call statuses after which the call no longer exists
pub const TERMINAL_STATUSES: &[&str] = &["completed", "busy", "failed", "no-answer", "canceled"];

pub fn is_terminal_status(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&status.trim().to_ascii_lowercase().as_str())
}

/// Incoming call and call status callbacks
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CallWebhook {
    pub call_sid: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub call_status: Option<String>,
    pub call_duration: Option<String>,
    pub direction: Option<String>,
    pub dial_call_status: Option<String>,
    pub dial_call_duration: Option<String>,
}

impl CallWebhook {
    pub fn call_sid(&self) -> &str {
        self.call_sid.as_deref().unwrap_or("unknown")
    }

    pub fn from_number(&self) -> &str {
        self.from.as_deref().unwrap_or("")
    }

    pub fn to_number(&self) -> &str {
        self.to.as_deref().unwrap_or("")
    }
}

/// `<Record action>` callback
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RecordingCallback {
    pub call_sid: Option<String>,
    pub recording_url: Option<String>,
    pub recording_sid: Option<String>,
    pub recording_duration: Option<String>,
}

/// `transcribeCallback` payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TranscriptionCallback {
    pub call_sid: Option<String>,
    pub transcription_text: Option<String>,
    pub transcription_status: Option<String>,
    pub recording_url: Option<String>,
}

/// `<Gather input="speech">` result
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GatherCallback {
    pub call_sid: Option<String>,
    pub speech_result: Option<String>,
    pub confidence: Option<String>,
}

impl GatherCallback {
    /// Confidence reported by the provider; missing or malformed counts as 0
    pub fn confidence(&self) -> f32 {
        parse_confidence(self.confidence.as_deref())
    }
}

/// Conference join parameters and status events
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConferenceWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "ConferenceSid")]
    pub conference_sid: Option<String>,
    #[serde(rename = "FriendlyName")]
    pub friendly_name: Option<String>,
    #[serde(rename = "ConferenceName")]
    pub conference_name: Option<String>,
    #[serde(rename = "StatusCallbackEvent")]
    pub status_callback_event: Option<String>,
    /// Query parameter set on the outbound leg's join URL
    pub conf: Option<String>,
}

impl ConferenceWebhook {
    pub fn conference(&self) -> Option<&str> {
        self.conf
            .as_deref()
            .or(self.conference_name.as_deref())
            .or(self.friendly_name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}

pub fn parse_confidence(value: Option<&str>) -> f32 {
    value
        .and_then(|v| v.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
        .unwrap_or(0.0)
}

/// Strip everything but digits and a leading `+` so numbers compare equal
pub fn normalize_number(number: &str) -> String {
    let trimmed = number.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_digit() || (i == 0 && c == '+') {
            out.push(c);
        }
    }
    out
}
