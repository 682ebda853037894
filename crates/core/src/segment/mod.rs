use crate::audio::Waveform;
use crate::config::{ChunkingConfig, MIN_AUDIO_SECS, MIN_WINDOW_SECS};
use serde::{Deserialize, Serialize};

const FRAME_LENGTH: usize = 2048;
const HOP_LENGTH: usize = 512;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("audio too short after preprocessing: {duration_secs:.2}s < {min_secs:.2}s")]
    AudioTooShort { duration_secs: f32, min_secs: f32 },
}

/// A fixed-duration slice of the input signal, analyzed independently.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Window {
    pub index: usize,
    pub start_time_secs: f32,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl Window {
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Normalizes, silence-trims and splits a waveform into overlapping
/// fixed-duration windows with timestamps.
#[derive(Clone, Copy, Debug)]
pub struct Segmenter {
    config: ChunkingConfig,
}

impl Segmenter {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Full preprocessing pipeline: normalize, optionally trim silence,
    /// then window. Windows come back in chronological order with
    /// contiguous indices.
    pub fn preprocess(
        &self,
        waveform: &Waveform,
        remove_silence: bool,
    ) -> Result<Vec<Window>, SegmentError> {
        let sr = waveform.sample_rate;
        let mut samples = normalize(&waveform.samples);

        // Silence removal is only worthwhile past one second of signal.
        if remove_silence && samples.len() > sr as usize {
            samples = self.trim_silence(&samples, sr);
        }

        let duration_secs = samples.len() as f32 / sr as f32;
        if duration_secs < MIN_AUDIO_SECS {
            return Err(SegmentError::AudioTooShort {
                duration_secs,
                min_secs: MIN_AUDIO_SECS,
            });
        }

        let chunk_samples = (self.config.chunk_duration_secs() * sr as f32) as usize;
        if samples.len() <= chunk_samples {
            return Ok(vec![Window {
                index: 0,
                start_time_secs: 0.0,
                sample_rate: sr,
                samples,
            }]);
        }

        let windows = self.chunk(samples, sr, chunk_samples);
        tracing::info!(windows = windows.len(), duration_secs, "audio segmented");
        Ok(windows)
    }

    fn trim_silence(&self, samples: &[f32], sample_rate: u32) -> Vec<f32> {
        let intervals = split_nonsilent(samples, self.config.top_db());
        if intervals.is_empty() {
            tracing::warn!("no non-silent intervals detected, keeping original signal");
            return samples.to_vec();
        }
        let trimmed: Vec<f32> = intervals
            .iter()
            .flat_map(|&(start, end)| samples[start..end].iter().copied())
            .collect();
        tracing::info!(
            before_secs = samples.len() as f32 / sample_rate as f32,
            after_secs = trimmed.len() as f32 / sample_rate as f32,
            "silence removed"
        );
        trimmed
    }

    fn chunk(&self, samples: Vec<f32>, sample_rate: u32, chunk_samples: usize) -> Vec<Window> {
        let hop_samples =
            ((chunk_samples as f32 * (1.0 - self.config.overlap())) as usize).max(1);
        let min_window_samples = (MIN_WINDOW_SECS * sample_rate as f32) as usize;

        let mut windows = Vec::new();
        let mut start = 0usize;
        while start < samples.len() {
            let end = usize::min(start + chunk_samples, samples.len());
            if end - start >= min_window_samples {
                windows.push(Window {
                    index: windows.len(),
                    start_time_secs: start as f32 / sample_rate as f32,
                    sample_rate,
                    samples: samples[start..end].to_vec(),
                });
            }
            start += hop_samples;
            if end >= samples.len() {
                break;
            }
        }
        windows
    }
}

/// Peak-normalizes to [-1, 1]. A silent signal passes through unchanged.
pub fn normalize(samples: &[f32]) -> Vec<f32> {
    let max_abs = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
    if max_abs == 0.0 {
        return samples.to_vec();
    }
    samples.iter().map(|&s| s / max_abs).collect()
}

/// Detects non-silent sample intervals: frames whose RMS is within
/// `top_db` decibels of the loudest frame. Returns merged half-open
/// `(start, end)` sample ranges; empty when the signal is entirely silent.
pub fn split_nonsilent(samples: &[f32], top_db: f32) -> Vec<(usize, usize)> {
    let rms = frame_rms(samples);
    let max_rms = rms.iter().fold(0.0f32, |m, &v| m.max(v));
    if max_rms == 0.0 {
        return Vec::new();
    }

    let mut intervals: Vec<(usize, usize)> = Vec::new();
    for (i, &value) in rms.iter().enumerate() {
        let db = 20.0 * (value.max(f32::MIN_POSITIVE) / max_rms).log10();
        if db <= -top_db {
            continue;
        }
        let start = i * HOP_LENGTH;
        let end = usize::min(start + FRAME_LENGTH, samples.len());
        match intervals.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => intervals.push((start, end)),
        }
    }
    intervals
}

/// Per-frame root-mean-square energy over fixed frames.
pub fn frame_rms(samples: &[f32]) -> Vec<f32> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut start = 0usize;
    loop {
        let end = usize::min(start + FRAME_LENGTH, samples.len());
        let frame = &samples[start..end];
        let energy: f32 = frame.iter().map(|&s| s * s).sum();
        out.push((energy / frame.len() as f32).sqrt());
        if end >= samples.len() {
            break;
        }
        start += HOP_LENGTH;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Waveform;

    const SR: u32 = 16_000;

    fn tone(freq: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
        let n = (duration_secs * SR as f32) as usize;
        (0..n)
            .map(|i| {
                amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SR as f32).sin()
            })
            .collect()
    }

    fn segmenter() -> Segmenter {
        Segmenter::new(ChunkingConfig::default())
    }

    #[test]
    fn short_signal_yields_single_window() {
        let w = Waveform::new(tone(220.0, 3.0, 0.5), SR).unwrap();
        let windows = segmenter().preprocess(&w, false).expect("segmented");
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start_time_secs, 0.0);
        assert_eq!(windows[0].samples.len(), w.samples.len());
    }

    #[test]
    fn twelve_second_signal_windows_at_expected_offsets() {
        let w = Waveform::new(tone(220.0, 12.0, 0.5), SR).unwrap();
        let windows = segmenter().preprocess(&w, false).expect("segmented");
        let starts: Vec<f32> = windows.iter().map(|w| w.start_time_secs).collect();
        assert_eq!(starts, vec![0.0, 2.5, 5.0, 7.5]);
        // All full-length except the trailing remainder.
        for w in &windows[..3] {
            assert_eq!(w.samples.len(), 5 * SR as usize);
        }
        assert!((windows[3].duration_secs() - 4.5).abs() < 1e-3);
    }

    #[test]
    fn window_starts_increase_by_hop() {
        let w = Waveform::new(tone(220.0, 23.0, 0.5), SR).unwrap();
        let windows = segmenter().preprocess(&w, false).expect("segmented");
        for pair in windows.windows(2) {
            assert!((pair[1].start_time_secs - pair[0].start_time_secs - 2.5).abs() < 1e-4);
        }
        for (i, w) in windows.iter().enumerate() {
            assert_eq!(w.index, i);
        }
    }

    #[test]
    fn sub_second_trailing_remainder_is_discarded() {
        // With zero overlap a 5.5s signal leaves a 0.5s tail, below the
        // minimum window length.
        let cfg = ChunkingConfig::new(5.0, 0.0, 30.0).unwrap();
        let w = Waveform::new(tone(220.0, 5.5, 0.5), SR).unwrap();
        let windows = Segmenter::new(cfg).preprocess(&w, false).expect("segmented");
        let starts: Vec<f32> = windows.iter().map(|w| w.start_time_secs).collect();
        assert_eq!(starts, vec![0.0]);
        assert_eq!(windows[0].samples.len(), 5 * SR as usize);
    }

    #[test]
    fn trailing_remainder_between_one_second_and_chunk_is_kept() {
        let cfg = ChunkingConfig::new(5.0, 0.0, 30.0).unwrap();
        let w = Waveform::new(tone(220.0, 7.0, 0.5), SR).unwrap();
        let windows = Segmenter::new(cfg).preprocess(&w, false).expect("segmented");
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].start_time_secs, 5.0);
        assert!((windows[1].duration_secs() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn too_short_signal_is_rejected() {
        let w = Waveform::new(tone(220.0, 0.3, 0.5), SR).unwrap();
        let err = segmenter().preprocess(&w, false).unwrap_err();
        assert!(matches!(err, SegmentError::AudioTooShort { .. }));
    }

    #[test]
    fn silent_signal_passes_through_trimming() {
        let w = Waveform::new(vec![0.0; 2 * SR as usize], SR).unwrap();
        let windows = segmenter().preprocess(&w, true).expect("segmented");
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].samples.len(), 2 * SR as usize);
    }

    #[test]
    fn trimming_removes_silent_middle() {
        let mut samples = tone(220.0, 2.0, 0.8);
        samples.extend(vec![0.0; 3 * SR as usize]);
        samples.extend(tone(220.0, 2.0, 0.8));
        let w = Waveform::new(samples, SR).unwrap();
        let windows = segmenter().preprocess(&w, true).expect("segmented");
        let total: usize = windows[0].samples.len();
        // Well under the 7s original; roughly the 4s of tone.
        assert!(total < 5 * SR as usize, "trimmed length {total}");
        assert!(total > 3 * SR as usize, "trimmed length {total}");
    }

    #[test]
    fn normalize_scales_peak_to_one() {
        let out = normalize(&[0.1, -0.2, 0.05]);
        assert!((out[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_silence_unchanged() {
        let out = normalize(&[0.0, 0.0, 0.0]);
        assert_eq!(out, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn split_nonsilent_empty_for_silence() {
        assert!(split_nonsilent(&vec![0.0; 8_000], 30.0).is_empty());
    }
}
