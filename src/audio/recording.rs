use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

use super::frame::AudioFrame;

/// A call recording decoded to mono 16-bit PCM
#[derive(Debug, Clone)]
pub struct DecodedRecording {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub duration_seconds: f64,
}

impl DecodedRecording {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening recording: {}", path.display());

        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        let extension = path.extension().and_then(|e| e.to_str());

        Self::decode(bytes, extension)
    }

    /// Decode an in-memory recording; `extension` helps the format probe
    pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self> {
        let mut hint = Hint::new();
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .context("Unrecognised recording format")?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .context("Recording has no audio track")?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .context("Recording has no sample rate")?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Unsupported recording codec")?;

        let mut samples: Vec<i16> = Vec::new();
        let mut channels: u16 = 1;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                // End of stream
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e).context("Failed to read recording packet"),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    channels = decoded.spec().channels.count().max(1) as u16;
                    let mut buf =
                        SampleBuffer::<i16>::new(decoded.capacity() as u64, *decoded.spec());
                    buf.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buf.samples());
                }
                Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::DecodeError(_)) => {
                    debug!("Skipping undecodable recording packet");
                    continue;
                }
                Err(e) => return Err(e).context("Failed to decode recording"),
            }
        }

        let mono = AudioFrame {
            samples,
            sample_rate,
            channels,
            timestamp_ms: 0,
        }
        .to_mono();

        let duration_seconds = mono.samples.len() as f64 / sample_rate as f64;

        info!(
            "Recording decoded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            sample_rate,
            channels,
            mono.samples.len()
        );

        Ok(Self {
            samples: mono.samples,
            sample_rate,
            duration_seconds,
        })
    }
}
