mod ffmpeg;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use ffmpeg::FfmpegAudioLoader;

/// A decoded mono audio signal.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> std::result::Result<Self, AudioError> {
        if samples.is_empty() {
            return Err(AudioError::EmptySignal);
        }
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate);
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn duration(&self) -> Duration {
        let micros =
            (self.samples.len() as u128 * 1_000_000u128) / u128::from(self.sample_rate);
        Duration::from_micros(micros.min(u128::from(u64::MAX)) as u64)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("unsupported or undecodable audio format: {0}")]
    UnsupportedFormat(String),

    #[error("ffmpeg unavailable: {0}")]
    FfmpegUnavailable(String),

    #[error("decode timed out after {0:?}")]
    DecodeTimeout(Duration),

    #[error("invalid pcm output: {0}")]
    InvalidPcm(String),

    #[error("decoded signal contains no samples")]
    EmptySignal,

    #[error("sample rate must be > 0")]
    InvalidSampleRate,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Decodes an audio file into a mono waveform at a fixed sample rate.
pub trait AudioLoader: Send + Sync {
    fn load(&self, path: PathBuf, target_sample_rate: u32) -> BoxFuture<'_, Result<Waveform>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_rejects_empty_samples() {
        let err = Waveform::new(Vec::new(), 16_000).unwrap_err();
        assert!(matches!(err, AudioError::EmptySignal));
    }

    #[test]
    fn waveform_rejects_zero_sample_rate() {
        let err = Waveform::new(vec![0.0; 4], 0).unwrap_err();
        assert!(matches!(err, AudioError::InvalidSampleRate));
    }

    #[test]
    fn duration_mono_16k() {
        let w = Waveform::new(vec![0.0; 16_000], 16_000).expect("valid");
        assert_eq!(w.duration().as_secs(), 1);
        assert!((w.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn duration_fractional() {
        let w = Waveform::new(vec![0.0; 8_000], 16_000).expect("valid");
        assert!((w.duration_secs() - 0.5).abs() < 1e-6);
    }
}
