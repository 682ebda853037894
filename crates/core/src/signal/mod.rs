//! Whole-utterance signal statistics consumed by the interpreter: pitch,
//! energy, spectral shape, speaking rate and pause structure. Independent
//! of the emotion pipeline; operates on the un-chunked signal.

use crate::audio::Waveform;
use crate::metrics::round_to;
use crate::segment::{frame_rms, split_nonsilent};
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

const PITCH_FRAME: usize = 2048;
const PITCH_HOP: usize = 1024;
const PITCH_MIN_HZ: f32 = 50.0;
const PITCH_MAX_HZ: f32 = 500.0;
const VOICED_RMS_FLOOR: f32 = 0.01;
const VOICED_CORRELATION: f32 = 0.5;

const SPECTRUM_FRAME: usize = 2048;
const SPECTRUM_HOP: usize = 512;
/// Fraction of spectral energy below the rolloff frequency.
const ROLLOFF_PERCENT: f32 = 0.85;

const ONSET_RMS_FLOOR: f32 = 0.02;
const ONSET_RISE_RATIO: f32 = 1.5;
/// Onset-to-word ratio used to approximate words per minute.
const WORDS_PER_ONSET: f32 = 0.6;

const MIN_PAUSE_SECS: f32 = 0.5;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("cannot extract {metric} from an empty signal")]
    EmptySignal { metric: &'static str },
}

/// Objective speech statistics over the whole utterance: pitch, energy and
/// zero-crossing tracks summarized as mean/spread, spectral shape, speaking
/// rate and speech/silence structure.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AudioMetrics {
    pub duration_secs: f32,
    /// 0.0 when no voiced frames were found, as are the other pitch fields.
    pub mean_pitch_hz: f32,
    pub std_pitch_hz: f32,
    pub min_pitch_hz: f32,
    pub max_pitch_hz: f32,
    pub pitch_range_hz: f32,
    pub mean_energy_db: f32,
    pub std_energy_db: f32,
    pub min_energy_db: f32,
    pub max_energy_db: f32,
    pub energy_range_db: f32,
    /// Brightness: magnitude-weighted mean frequency per frame.
    pub mean_spectral_centroid_hz: f32,
    pub std_spectral_centroid_hz: f32,
    pub mean_spectral_rolloff_hz: f32,
    pub mean_zero_crossing_rate: f32,
    pub std_zero_crossing_rate: f32,
    pub estimated_wpm: f32,
    pub speech_ratio: f32,
    pub speech_duration_secs: f32,
    pub silence_duration_secs: f32,
    pub pause_count: usize,
}

/// Extracts all metrics. Each extractor fails explicitly instead of
/// silently zeroing; the caller decides whether a default is acceptable.
pub fn extract(waveform: &Waveform, top_db: f32) -> Result<AudioMetrics, ExtractionError> {
    let samples = &waveform.samples;
    let sr = waveform.sample_rate;

    let pitch = series_stats(&pitch_track(samples, sr)?);
    let energy_track = energy_db_track(samples);
    if energy_track.is_empty() {
        return Err(ExtractionError::EmptySignal { metric: "energy" });
    }
    let energy = series_stats(&energy_track);
    let spectral = spectral_tracks(samples, sr);
    let centroid = series_stats(&spectral.centroid_hz);
    let rolloff = series_stats(&spectral.rolloff_hz);
    let zcr = series_stats(&zcr_track(samples));
    let wpm = estimated_wpm(samples, sr)?;
    let speech = speech_stats(samples, sr, top_db)?;

    Ok(AudioMetrics {
        duration_secs: round_to(waveform.duration_secs(), 2),
        mean_pitch_hz: round_to(pitch.mean, 2),
        std_pitch_hz: round_to(pitch.std, 2),
        min_pitch_hz: round_to(pitch.min, 2),
        max_pitch_hz: round_to(pitch.max, 2),
        pitch_range_hz: round_to(pitch.max - pitch.min, 2),
        mean_energy_db: round_to(energy.mean, 2),
        std_energy_db: round_to(energy.std, 2),
        min_energy_db: round_to(energy.min, 2),
        max_energy_db: round_to(energy.max, 2),
        energy_range_db: round_to(energy.max - energy.min, 2),
        mean_spectral_centroid_hz: round_to(centroid.mean, 2),
        std_spectral_centroid_hz: round_to(centroid.std, 2),
        mean_spectral_rolloff_hz: round_to(rolloff.mean, 2),
        mean_zero_crossing_rate: round_to(zcr.mean, 3),
        std_zero_crossing_rate: round_to(zcr.std, 3),
        estimated_wpm: round_to(wpm, 2),
        speech_ratio: round_to(speech.ratio, 3),
        speech_duration_secs: round_to(speech.speech_secs, 2),
        silence_duration_secs: round_to(speech.silence_secs, 2),
        pause_count: speech.pause_count,
    })
}

#[derive(Clone, Copy, Debug, Default)]
struct SeriesStats {
    mean: f32,
    std: f32,
    min: f32,
    max: f32,
}

/// Mean, population standard deviation, min and max of a track. All zero
/// for an empty track, matching the pitch-of-unvoiced-signal convention.
fn series_stats(values: &[f32]) -> SeriesStats {
    if values.is_empty() {
        return SeriesStats::default();
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f32>() / n;
    let min = values.iter().fold(f32::INFINITY, |m, &v| m.min(v));
    let max = values.iter().fold(f32::NEG_INFINITY, |m, &v| m.max(v));
    SeriesStats {
        mean,
        std: variance.sqrt(),
        min,
        max,
    }
}

/// Per-frame fundamental frequency over voiced frames, via normalized
/// autocorrelation in the 50-500 Hz band. Unvoiced frames are omitted, so
/// the track is empty for silence.
pub fn pitch_track(samples: &[f32], sample_rate: u32) -> Result<Vec<f32>, ExtractionError> {
    if samples.is_empty() {
        return Err(ExtractionError::EmptySignal { metric: "pitch" });
    }
    let min_lag = ((sample_rate as f32 / PITCH_MAX_HZ) as usize).max(1);
    let max_lag = (sample_rate as f32 / PITCH_MIN_HZ) as usize;

    let mut pitches = Vec::new();
    let mut start = 0usize;
    while start + PITCH_FRAME <= samples.len() {
        let frame = &samples[start..start + PITCH_FRAME];
        start += PITCH_HOP;

        let r0: f32 = frame.iter().map(|&s| s * s).sum();
        if (r0 / PITCH_FRAME as f32).sqrt() < VOICED_RMS_FLOOR {
            continue;
        }

        let mut best_lag = 0usize;
        let mut best_r = 0.0f32;
        for lag in min_lag..=max_lag.min(PITCH_FRAME - 1) {
            let r: f32 = frame[..PITCH_FRAME - lag]
                .iter()
                .zip(&frame[lag..])
                .map(|(&a, &b)| a * b)
                .sum();
            if r > best_r {
                best_r = r;
                best_lag = lag;
            }
        }
        if best_lag > 0 && best_r > VOICED_CORRELATION * r0 {
            pitches.push(sample_rate as f32 / best_lag as f32);
        }
    }
    Ok(pitches)
}

/// Mean fundamental frequency over voiced frames; 0.0 when nothing in the
/// signal is voiced.
pub fn mean_pitch_hz(samples: &[f32], sample_rate: u32) -> Result<f32, ExtractionError> {
    let track = pitch_track(samples, sample_rate)?;
    if track.is_empty() {
        return Ok(0.0);
    }
    Ok(track.iter().sum::<f32>() / track.len() as f32)
}

fn energy_db_track(samples: &[f32]) -> Vec<f32> {
    frame_rms(samples)
        .iter()
        .map(|&v| 20.0 * v.max(1e-10).log10())
        .collect()
}

/// Mean per-frame RMS energy in decibels, full-scale reference.
pub fn mean_energy_db(samples: &[f32]) -> Result<f32, ExtractionError> {
    let track = energy_db_track(samples);
    if track.is_empty() {
        return Err(ExtractionError::EmptySignal { metric: "energy" });
    }
    Ok(track.iter().sum::<f32>() / track.len() as f32)
}

struct SpectralTracks {
    centroid_hz: Vec<f32>,
    rolloff_hz: Vec<f32>,
}

/// Per-frame spectral centroid and rolloff from Hann-windowed FFT
/// magnitude spectra. Frames with no spectral energy contribute 0 Hz;
/// signals shorter than one frame yield empty tracks.
fn spectral_tracks(samples: &[f32], sample_rate: u32) -> SpectralTracks {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(SPECTRUM_FRAME);
    let bin_hz = sample_rate as f32 / SPECTRUM_FRAME as f32;
    let hann: Vec<f32> = (0..SPECTRUM_FRAME)
        .map(|i| {
            (std::f32::consts::PI * i as f32 / SPECTRUM_FRAME as f32)
                .sin()
                .powi(2)
        })
        .collect();

    let mut centroid_hz = Vec::new();
    let mut rolloff_hz = Vec::new();
    let mut start = 0usize;
    while start + SPECTRUM_FRAME <= samples.len() {
        let mut buffer: Vec<Complex<f32>> = samples[start..start + SPECTRUM_FRAME]
            .iter()
            .zip(&hann)
            .map(|(&s, &w)| Complex { re: s * w, im: 0.0 })
            .collect();
        start += SPECTRUM_HOP;
        fft.process(&mut buffer);

        // Real input: only the non-negative half of the spectrum.
        let magnitudes: Vec<f32> = buffer[..SPECTRUM_FRAME / 2 + 1]
            .iter()
            .map(|c| c.norm())
            .collect();
        let total: f32 = magnitudes.iter().sum();
        if total <= 0.0 {
            centroid_hz.push(0.0);
            rolloff_hz.push(0.0);
            continue;
        }

        let weighted: f32 = magnitudes
            .iter()
            .enumerate()
            .map(|(i, &m)| i as f32 * bin_hz * m)
            .sum();
        centroid_hz.push(weighted / total);

        let threshold = ROLLOFF_PERCENT * total;
        let mut cumulative = 0.0f32;
        let mut rolloff_bin = magnitudes.len() - 1;
        for (i, &m) in magnitudes.iter().enumerate() {
            cumulative += m;
            if cumulative >= threshold {
                rolloff_bin = i;
                break;
            }
        }
        rolloff_hz.push(rolloff_bin as f32 * bin_hz);
    }
    SpectralTracks {
        centroid_hz,
        rolloff_hz,
    }
}

/// Fraction of adjacent sample pairs that change sign.
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

fn zcr_track(samples: &[f32]) -> Vec<f32> {
    let mut out = Vec::new();
    let mut start = 0usize;
    while start + SPECTRUM_FRAME <= samples.len() {
        out.push(zero_crossing_rate(&samples[start..start + SPECTRUM_FRAME]));
        start += SPECTRUM_HOP;
    }
    if out.is_empty() && !samples.is_empty() {
        out.push(zero_crossing_rate(samples));
    }
    out
}

/// Words-per-minute estimate from energy-rise onsets.
pub fn estimated_wpm(samples: &[f32], sample_rate: u32) -> Result<f32, ExtractionError> {
    if samples.is_empty() {
        return Err(ExtractionError::EmptySignal {
            metric: "speaking rate",
        });
    }
    let rms = frame_rms(samples);
    let mut onsets = 0usize;
    for pair in rms.windows(2) {
        if pair[1] > ONSET_RMS_FLOOR && pair[1] > ONSET_RISE_RATIO * pair[0] {
            onsets += 1;
        }
    }
    let duration_secs = samples.len() as f32 / sample_rate as f32;
    Ok(onsets as f32 / duration_secs * 60.0 * WORDS_PER_ONSET)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeechStats {
    pub speech_secs: f32,
    pub silence_secs: f32,
    pub ratio: f32,
    pub pause_count: usize,
}

/// Speech/silence split over the whole signal, with pauses counted as
/// silent gaps of at least half a second between non-silent intervals.
pub fn speech_stats(
    samples: &[f32],
    sample_rate: u32,
    top_db: f32,
) -> Result<SpeechStats, ExtractionError> {
    if samples.is_empty() {
        return Err(ExtractionError::EmptySignal {
            metric: "speech ratio",
        });
    }
    let intervals = split_nonsilent(samples, top_db);
    let total_secs = samples.len() as f32 / sample_rate as f32;
    let speech_secs: f32 = intervals
        .iter()
        .map(|&(s, e)| (e - s) as f32 / sample_rate as f32)
        .sum();
    let speech_secs = speech_secs.min(total_secs);

    let min_pause_samples = (MIN_PAUSE_SECS * sample_rate as f32) as usize;
    let pause_count = intervals
        .windows(2)
        .filter(|pair| pair[1].0 - pair[0].1 >= min_pause_samples)
        .count();

    Ok(SpeechStats {
        speech_secs,
        silence_secs: total_secs - speech_secs,
        ratio: speech_secs / total_secs,
        pause_count,
    })
}
