use super::codec::{decode_mulaw, TELEPHONY_SAMPLE_RATE};

/// Decoded audio frame
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// PCM samples (16-bit signed integers, interleaved if multi-channel)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Milliseconds since the stream started, as reported by the provider
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Frame from raw telephony µ-law bytes
    pub fn from_mulaw(bytes: &[u8], timestamp_ms: u64) -> Self {
        Self {
            samples: decode_mulaw(bytes),
            sample_rate: TELEPHONY_SAMPLE_RATE,
            channels: 1,
            timestamp_ms,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0;
        }
        let frames = self.samples.len() as u64 / self.channels as u64;
        frames * 1000 / self.sample_rate as u64
    }

    /// Downmix to mono by averaging channels
    pub fn to_mono(self) -> AudioFrame {
        if self.channels <= 1 {
            return self;
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect();

        AudioFrame {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
            timestamp_ms: self.timestamp_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mulaw_frame_is_8khz_mono() {
        let frame = AudioFrame::from_mulaw(&[0xFF; 160], 40);
        assert_eq!(frame.sample_rate, 8000);
        assert_eq!(frame.channels, 1);
        assert_eq!(frame.samples.len(), 160);
        assert_eq!(frame.duration_ms(), 20);
    }

    #[test]
    fn test_stereo_downmix_averages() {
        let frame = AudioFrame {
            samples: vec![100, 300, -200, 200],
            sample_rate: 8000,
            channels: 2,
            timestamp_ms: 0,
        };
        let mono = frame.to_mono();
        assert_eq!(mono.channels, 1);
        assert_eq!(mono.samples, vec![200, 0]);
    }
}
