use crate::config::VadConfig;
use std::collections::VecDeque;

/// Outcome of feeding one frame to the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadEvent {
    SpeechStarted,
    Speaking,
    SpeechEnded,
    Silence,
}

/// Root mean square of the samples, normalised to 0.0 - 1.0
pub fn rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64 / i16::MAX as f64;
            v * v
        })
        .sum();

    (sum / samples.len() as f64).sqrt().min(1.0)
}

/// Energy-threshold voice activity detector with a silence hangover
///
/// A frame above `threshold` starts (or continues) speech. Speech ends only
/// once more than `silence_frames` consecutive frames have been quiet, so
/// short pauses between words do not split an utterance.
#[derive(Debug, Clone)]
pub struct VoiceActivityDetector {
    threshold: f64,
    silence_frames: u32,
    speaking: bool,
    silence_count: u32,
    history: VecDeque<f64>,
    history_len: usize,
}

impl VoiceActivityDetector {
    pub fn new(config: &VadConfig) -> Self {
        Self {
            threshold: config.threshold,
            silence_frames: config.silence_frames,
            speaking: false,
            silence_count: 0,
            history: VecDeque::with_capacity(config.history_len),
            history_len: config.history_len,
        }
    }

    pub fn process(&mut self, samples: &[i16]) -> VadEvent {
        // A single sample carries no usable energy estimate
        if samples.len() < 2 {
            return self.quiet_frame();
        }

        let level = rms(samples);
        self.record(level);

        if level > self.threshold {
            self.silence_count = 0;
            if self.speaking {
                VadEvent::Speaking
            } else {
                self.speaking = true;
                VadEvent::SpeechStarted
            }
        } else {
            self.quiet_frame()
        }
    }

    fn quiet_frame(&mut self) -> VadEvent {
        if !self.speaking {
            return VadEvent::Silence;
        }

        self.silence_count += 1;
        if self.silence_count > self.silence_frames {
            self.speaking = false;
            self.silence_count = 0;
            VadEvent::SpeechEnded
        } else {
            VadEvent::Speaking
        }
    }

    fn record(&mut self, level: f64) {
        if self.history_len == 0 {
            return;
        }
        if self.history.len() == self.history_len {
            self.history.pop_front();
        }
        self.history.push_back(level);
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    /// Mean of the recent RMS history
    pub fn average_level(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn history(&self) -> impl Iterator<Item = f64> + '_ {
        self.history.iter().copied()
    }

    pub fn reset(&mut self) {
        self.speaking = false;
        self.silence_count = 0;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_bounds() {
        assert_eq!(rms(&[]), 0.0);
        assert_eq!(rms(&[0; 160]), 0.0);
        let full = rms(&[i16::MAX; 160]);
        assert!((full - 1.0).abs() < 1e-9);
        assert!(rms(&[i16::MIN; 160]) <= 1.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let config = VadConfig {
            threshold: 0.01,
            silence_frames: 2,
            history_len: 3,
        };
        let mut vad = VoiceActivityDetector::new(&config);
        for _ in 0..10 {
            vad.process(&[1000; 160]);
        }
        assert_eq!(vad.history().count(), 3);
    }
}
