pub mod clips;
pub mod codec;
pub mod dump;
pub mod frame;
pub mod recording;
pub mod vad;

pub use clips::{ClipStore, StoredClip};
pub use codec::{decode_mulaw, encode_mulaw, TELEPHONY_SAMPLE_RATE};
pub use dump::AudioDumper;
pub use frame::AudioFrame;
pub use recording::DecodedRecording;
pub use vad::{VadEvent, VoiceActivityDetector};
