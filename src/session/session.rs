use super::config::SessionConfig;
use super::stats::StreamStats;
use crate::audio::codec::decode_mulaw;
use crate::audio::{VadEvent, VoiceActivityDetector};
use crate::language::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Which leg of a call a media stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    /// The only stream of a call; both parties speak on it
    Single,
    /// The person who dialled in
    Caller,
    /// The forwarded party
    Receiver,
}

impl Participant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Participant::Single => "single",
            Participant::Caller => "caller",
            Participant::Receiver => "receiver",
        }
    }

    /// The other leg of a two-leg call
    pub fn peer(&self) -> Option<Participant> {
        match self {
            Participant::Single => None,
            Participant::Caller => Some(Participant::Receiver),
            Participant::Receiver => Some(Participant::Caller),
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Participant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Participant::Single),
            "caller" => Ok(Participant::Caller),
            "receiver" => Ok(Participant::Receiver),
            other => Err(format!("unknown participant: {}", other)),
        }
    }
}

/// Audio queued for a stream's writer task
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundAudio {
    /// µ-law clip, followed by a mark when `mark` is set
    Clip { audio: Vec<u8>, mark: Option<String> },
    /// Drop anything the provider still has buffered
    Clear,
}

/// State of one active media stream
pub struct CallSession {
    pub call_sid: String,
    pub stream_sid: String,
    pub participant: Participant,

    /// Last transcript accepted for translation
    pub last_transcript: Option<String>,

    /// When the last transcript was accepted (rate limiting)
    pub last_translation_at: Option<Instant>,

    /// Language expected next on this stream
    pub current_language: Language,

    config: SessionConfig,
    is_processing: bool,
    buffer: Vec<u8>,
    vad: VoiceActivityDetector,
    outbox: mpsc::Sender<OutboundAudio>,

    media_frames: u64,
    bytes_received: u64,
    translations: u64,
    dropped_frames: u64,
    output_clips: u64,
    /// Clips sent with a mark that the provider has not acknowledged yet
    pending_playback: usize,
    started_at: DateTime<Utc>,
}

impl CallSession {
    pub fn new(
        call_sid: impl Into<String>,
        stream_sid: impl Into<String>,
        participant: Participant,
        language: Language,
        config: SessionConfig,
        outbox: mpsc::Sender<OutboundAudio>,
    ) -> Self {
        let vad = VoiceActivityDetector::new(&config.vad);
        let buffer = Vec::with_capacity(config.buffer_bytes);

        Self {
            call_sid: call_sid.into(),
            stream_sid: stream_sid.into(),
            participant,
            last_transcript: None,
            last_translation_at: None,
            current_language: language,
            config,
            is_processing: false,
            buffer,
            vad,
            outbox,
            media_frames: 0,
            bytes_received: 0,
            translations: 0,
            dropped_frames: 0,
            output_clips: 0,
            pending_playback: 0,
            started_at: Utc::now(),
        }
    }

    /// Feed one frame of µ-law audio.
    ///
    /// Returns a chunk ready for recognition when the buffer is full, or when
    /// speech ends with at least `min_utterance_bytes` buffered.
    pub fn push_media(&mut self, mulaw: &[u8]) -> Option<Vec<u8>> {
        self.media_frames += 1;
        self.bytes_received += mulaw.len() as u64;

        if self.is_processing {
            self.dropped_frames += 1;
            return None;
        }

        let pcm = decode_mulaw(mulaw);
        match self.vad.process(&pcm) {
            VadEvent::SpeechStarted => {
                // The speaker talks over our playback on a shared stream
                if self.participant == Participant::Single && self.pending_playback > 0 {
                    self.enqueue_output(OutboundAudio::Clear);
                }
                self.buffer_speech(mulaw)
            }
            VadEvent::Speaking => self.buffer_speech(mulaw),
            VadEvent::SpeechEnded => {
                if self.buffer.len() >= self.config.min_utterance_bytes {
                    Some(self.take_buffer())
                } else {
                    debug!(
                        "Discarding {} byte utterance on {}",
                        self.buffer.len(),
                        self.stream_sid
                    );
                    self.buffer.clear();
                    None
                }
            }
            VadEvent::Silence => None,
        }
    }

    fn buffer_speech(&mut self, mulaw: &[u8]) -> Option<Vec<u8>> {
        self.buffer.extend_from_slice(mulaw);
        if self.buffer.len() >= self.config.buffer_bytes {
            return Some(self.take_buffer());
        }
        None
    }

    fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.buffer, Vec::with_capacity(self.config.buffer_bytes))
    }

    /// Gate a transcript before it is translated
    pub fn accept_transcript(&mut self, text: &str, confidence: f32, now: Instant) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        if self.last_transcript.as_deref() == Some(text) {
            debug!("Ignoring repeated transcript on {}", self.stream_sid);
            return false;
        }

        if confidence < self.config.min_confidence {
            debug!(
                "Ignoring low confidence transcript ({:.2}) on {}",
                confidence, self.stream_sid
            );
            return false;
        }

        if let Some(last) = self.last_translation_at {
            if now.saturating_duration_since(last) < self.config.min_interval {
                debug!("Rate limiting transcript on {}", self.stream_sid);
                return false;
            }
        }

        self.last_transcript = Some(text.to_string());
        self.last_translation_at = Some(now);
        true
    }

    /// Claim the stream for chunk processing; false if already claimed
    pub fn begin_processing(&mut self) -> bool {
        if self.is_processing {
            return false;
        }
        self.is_processing = true;
        true
    }

    pub fn finish_processing(&mut self) {
        self.is_processing = false;
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// Count a completed translation; a single stream then expects the other language
    pub fn record_translation(&mut self) {
        self.translations += 1;
        if self.participant == Participant::Single {
            self.current_language = self.current_language.other();
        }
    }

    /// Queue audio for this stream's writer; false if the queue is full or closed
    pub fn enqueue_output(&mut self, audio: OutboundAudio) -> bool {
        let (is_clip, has_mark) = match &audio {
            OutboundAudio::Clip { mark, .. } => (true, mark.is_some()),
            OutboundAudio::Clear => (false, false),
        };

        match self.outbox.try_send(audio) {
            Ok(()) => {
                if is_clip {
                    self.output_clips += 1;
                    if has_mark {
                        self.pending_playback += 1;
                    }
                } else {
                    self.pending_playback = 0;
                }
                true
            }
            Err(e) => {
                warn!("Failed to queue output audio on {}: {}", self.stream_sid, e);
                false
            }
        }
    }

    /// The provider reports a marked clip finished playing
    pub fn playback_finished(&mut self, mark: &str) {
        debug!("Playback of {} finished on {}", mark, self.stream_sid);
        self.pending_playback = self.pending_playback.saturating_sub(1);
    }

    pub fn pending_playback(&self) -> usize {
        self.pending_playback
    }

    pub fn stats(&self) -> StreamStats {
        let now = Utc::now();
        StreamStats {
            call_sid: self.call_sid.clone(),
            stream_sid: self.stream_sid.clone(),
            participant: self.participant,
            current_language: self.current_language,
            is_processing: self.is_processing,
            speaking: self.vad.is_speaking(),
            buffered_bytes: self.buffer.len(),
            media_frames: self.media_frames,
            bytes_received: self.bytes_received,
            translations: self.translations,
            dropped_frames: self.dropped_frames,
            output_clips: self.output_clips,
            pending_playback: self.pending_playback,
            last_transcript: self.last_transcript.clone(),
            started_at: self.started_at,
            duration_secs: (now - self.started_at).num_milliseconds() as f64 / 1000.0,
        }
    }
}
