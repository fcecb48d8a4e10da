use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use super::codec::{decode_mulaw, TELEPHONY_SAMPLE_RATE};

/// Writes telephony audio to numbered WAV files for offline inspection
#[derive(Debug)]
pub struct AudioDumper {
    output_dir: PathBuf,
    counters: Mutex<HashMap<String, usize>>,
}

impl AudioDumper {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).context("Failed to create dump directory")?;

        info!("Audio dumps enabled: {}", output_dir.display());

        Ok(Self {
            output_dir,
            counters: Mutex::new(HashMap::new()),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write a µ-law clip as `<stream>-<direction>-<NNN>.wav` (8 kHz mono 16-bit)
    pub fn dump_mulaw(&self, stream_sid: &str, direction: &str, mulaw: &[u8]) -> Result<PathBuf> {
        let key = format!("{}-{}", stream_sid, direction);
        let index = {
            let mut counters = self
                .counters
                .lock()
                .map_err(|_| anyhow::anyhow!("dump counter lock poisoned"))?;
            let counter = counters.entry(key.clone()).or_insert(0);
            let index = *counter;
            *counter += 1;
            index
        };

        let file_path = self.output_dir.join(format!("{}-{:03}.wav", key, index));

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: TELEPHONY_SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = hound::WavWriter::create(&file_path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", file_path))?;

        for sample in decode_mulaw(mulaw) {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }

        writer.finalize().context("Failed to finalize WAV file")?;

        debug!("Dumped {} bytes to {}", mulaw.len(), file_path.display());

        Ok(file_path)
    }
}
