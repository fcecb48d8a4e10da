//! Call and media stream session tracking
//!
//! This module provides:
//! - `CallSession`, the per-stream record (audio buffer, VAD, rate limiting,
//!   language flag, outbound audio queue)
//! - `SessionRegistry`, the shared map of active streams and calls
//! - Stream statistics and call transcript records

mod config;
mod registry;
mod session;
mod stats;

pub use config::SessionConfig;
pub use registry::{SessionRegistry, SharedSession};
pub use session::{CallSession, OutboundAudio, Participant};
pub use stats::{CallRecord, StreamStats, TranscriptEntry};
