// Integration tests for the audio layer
//
// Covers the VAD state machine, WAV dumps of telephony audio and decoding of
// call recordings.

use anyhow::Result;
use call_translator::audio::codec::{encode_mulaw, strip_wav_header};
use call_translator::audio::{AudioDumper, DecodedRecording, VadEvent, VoiceActivityDetector};
use call_translator::config::VadConfig;
use std::fs;
use tempfile::TempDir;

fn vad(silence_frames: u32) -> VoiceActivityDetector {
    VoiceActivityDetector::new(&VadConfig {
        threshold: 0.01,
        silence_frames,
        history_len: 20,
    })
}

fn loud() -> Vec<i16> {
    vec![8000; 160]
}

fn quiet() -> Vec<i16> {
    vec![0; 160]
}

#[test]
fn test_vad_speech_lifecycle() {
    let mut vad = vad(3);

    assert_eq!(vad.process(&quiet()), VadEvent::Silence);
    assert_eq!(vad.process(&loud()), VadEvent::SpeechStarted);
    assert_eq!(vad.process(&loud()), VadEvent::Speaking);
    assert!(vad.is_speaking());

    // Hangover: up to `silence_frames` quiet frames keep the utterance open
    for _ in 0..3 {
        assert_eq!(vad.process(&quiet()), VadEvent::Speaking);
    }
    assert_eq!(vad.process(&quiet()), VadEvent::SpeechEnded);
    assert!(!vad.is_speaking());
    assert_eq!(vad.process(&quiet()), VadEvent::Silence);
}

#[test]
fn test_vad_loud_frame_resets_hangover() {
    let mut vad = vad(2);

    vad.process(&loud());
    vad.process(&quiet());
    vad.process(&quiet());
    assert_eq!(vad.process(&loud()), VadEvent::Speaking);

    vad.process(&quiet());
    vad.process(&quiet());
    assert_eq!(vad.process(&quiet()), VadEvent::SpeechEnded);
}

#[test]
fn test_vad_tiny_frames_count_as_quiet() {
    let mut vad = vad(0);

    assert_eq!(vad.process(&[i16::MAX]), VadEvent::Silence);
    assert_eq!(vad.process(&[]), VadEvent::Silence);

    assert_eq!(vad.process(&loud()), VadEvent::SpeechStarted);
    assert_eq!(vad.process(&[i16::MAX]), VadEvent::SpeechEnded);
    assert_eq!(vad.history().count(), 1, "tiny frames are not recorded");
}

#[test]
fn test_vad_average_level_and_reset() {
    let mut vad = vad(5);
    vad.process(&loud());
    vad.process(&quiet());

    let average = vad.average_level();
    assert!(average > 0.0 && average < 1.0);

    vad.reset();
    assert!(!vad.is_speaking());
    assert_eq!(vad.average_level(), 0.0);
    assert_eq!(vad.process(&quiet()), VadEvent::Silence);
}

#[test]
fn test_dump_writes_numbered_wav_files() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dumper = AudioDumper::new(temp_dir.path().join("dumps"))?;

    let mulaw = encode_mulaw(&vec![1000i16; 800]);
    let first = dumper.dump_mulaw("MZ123", "outbound", &mulaw)?;
    let second = dumper.dump_mulaw("MZ123", "outbound", &mulaw)?;
    let inbound = dumper.dump_mulaw("MZ123", "inbound", &mulaw)?;

    assert!(first.ends_with("MZ123-outbound-000.wav"));
    assert!(second.ends_with("MZ123-outbound-001.wav"));
    assert!(inbound.ends_with("MZ123-inbound-000.wav"));

    let reader = hound::WavReader::open(&first)?;
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 8000);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(reader.len(), 800);

    assert_eq!(fs::read_dir(dumper.output_dir())?.count(), 3);

    Ok(())
}

fn write_wav(path: &std::path::Path, sample_rate: u32, channels: u16, frames: usize) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..frames {
        for _ in 0..channels {
            writer.write_sample(((i % 100) as i16) * 100)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

#[test]
fn test_recording_decodes_stereo_wav_to_mono() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("recording.wav");
    write_wav(&path, 16000, 2, 16000)?;

    let recording = DecodedRecording::open(&path)?;

    assert_eq!(recording.sample_rate, 16000);
    assert_eq!(recording.samples.len(), 16000);
    assert!((recording.duration_seconds - 1.0).abs() < 0.01);
    assert_eq!(recording.samples[1], 100);

    Ok(())
}

#[test]
fn test_recording_decode_from_memory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("call.wav");
    write_wav(&path, 8000, 1, 4000)?;

    let recording = DecodedRecording::decode(fs::read(&path)?, Some("wav"))?;
    assert_eq!(recording.sample_rate, 8000);
    assert_eq!(recording.samples.len(), 4000);

    Ok(())
}

#[test]
fn test_recording_rejects_garbage() {
    let result = DecodedRecording::decode(b"definitely not audio".to_vec(), None);
    assert!(result.is_err());
}

#[test]
fn test_recording_open_nonexistent() {
    assert!(DecodedRecording::open("/nonexistent/path/to/recording.wav").is_err());
}

#[test]
fn test_strip_wav_header_of_hound_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("tts.wav");
    write_wav(&path, 8000, 1, 320)?;

    let bytes = fs::read(&path)?;
    let data = strip_wav_header(&bytes);
    assert_eq!(data.len(), 640);
    assert_eq!(&data[2..4], &100i16.to_le_bytes());

    Ok(())
}
