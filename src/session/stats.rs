use crate::config::CallMode;
use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::Participant;

/// Statistics about one active media stream
#[derive(Debug, Clone, Serialize)]
pub struct StreamStats {
    pub call_sid: String,
    pub stream_sid: String,
    pub participant: Participant,

    /// Language currently expected on this stream
    pub current_language: Language,

    pub is_processing: bool,
    pub speaking: bool,
    pub buffered_bytes: usize,

    pub media_frames: u64,
    pub bytes_received: u64,
    pub translations: u64,

    /// Frames discarded because a chunk was still being processed
    pub dropped_frames: u64,

    pub output_clips: u64,
    pub pending_playback: usize,

    pub last_transcript: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
}

/// One translated utterance in a call's transcript log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub participant: Participant,
    pub original: String,
    pub translated: String,
    pub source: Language,
    pub target: Language,

    /// Recognition confidence (0.0 to 1.0), if available
    pub confidence: Option<f32>,

    pub timestamp: DateTime<Utc>,
}

/// A call known to the service, from the incoming webhook until it ends
#[derive(Debug, Clone, Serialize)]
pub struct CallRecord {
    pub call_sid: String,
    pub from: String,
    pub to: String,
    pub forward_to: Option<String>,
    pub mode: CallMode,
    pub caller_language: Language,
    pub receiver_language: Language,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub transcript: Vec<TranscriptEntry>,
}

impl CallRecord {
    pub fn new(
        call_sid: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        mode: CallMode,
        caller_language: Language,
    ) -> Self {
        Self {
            call_sid: call_sid.into(),
            from: from.into(),
            to: to.into(),
            forward_to: None,
            mode,
            caller_language,
            receiver_language: caller_language.other(),
            status: "ringing".to_string(),
            started_at: Utc::now(),
            ended_at: None,
            transcript: Vec::new(),
        }
    }

    pub fn with_forward_to(mut self, number: Option<String>) -> Self {
        self.forward_to = number;
        self
    }

    pub fn duration_secs(&self) -> f64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
