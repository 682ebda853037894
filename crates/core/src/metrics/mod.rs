//! Objective statistics over an emotion timeline: switch-rate stability,
//! confidence dispersion, distributional entropy, dominant-emotion ratio,
//! peak confidence and shift duration.

use crate::aggregate::TimelineEntry;
use crate::classify::Emotion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveMetrics {
    /// 1 minus the rate of emotion changes across consecutive windows.
    pub stability: f32,
    pub confidence_std_dev: f32,
    /// Shannon entropy of the emotion distribution, in bits.
    pub entropy_bits: f32,
    pub dominant_ratio: f32,
    pub peak_confidence: f32,
    pub shift_duration_secs: f32,
}

/// Derives objective metrics from a timeline and its aggregate verdict.
/// Pure function; internals run at full precision, outputs are rounded to
/// three decimals (two for the shift duration).
pub fn compute(
    timeline: &[TimelineEntry],
    distribution_pct: &BTreeMap<Emotion, f32>,
    dominant_emotion: Emotion,
    chunk_duration_secs: f32,
) -> ObjectiveMetrics {
    let n = timeline.len();

    let stability = if n < 2 {
        1.0
    } else {
        let switches = timeline
            .windows(2)
            .filter(|pair| pair[0].emotion != pair[1].emotion)
            .count();
        1.0 - switches as f32 / (n - 1) as f32
    };

    let confidence_std_dev = if n < 2 {
        0.0
    } else {
        let mean = timeline.iter().map(|e| e.confidence).sum::<f32>() / n as f32;
        let variance = timeline
            .iter()
            .map(|e| (e.confidence - mean).powi(2))
            .sum::<f32>()
            / n as f32;
        variance.sqrt()
    };

    let entropy_bits = if n < 2 {
        0.0
    } else {
        -distribution_pct
            .values()
            .map(|&pct| pct / 100.0)
            .filter(|&p| p > 0.0)
            .map(|p| p * p.log2())
            .sum::<f32>()
    };

    let dominant_count = timeline
        .iter()
        .filter(|e| e.emotion == dominant_emotion)
        .count();
    let dominant_ratio = if n == 0 {
        0.0
    } else {
        dominant_count as f32 / n as f32
    };

    let peak_confidence = timeline.iter().fold(0.0f32, |m, e| m.max(e.confidence));

    let shifts: Vec<&TimelineEntry> = timeline
        .iter()
        .filter(|e| e.emotion != dominant_emotion)
        .collect();
    let shift_duration_secs = if shifts.len() >= 2 {
        // The last shifted chunk spans its own duration past its start.
        shifts[shifts.len() - 1].time_secs - shifts[0].time_secs + chunk_duration_secs
    } else {
        0.0
    };

    ObjectiveMetrics {
        stability: round_to(stability, 3),
        confidence_std_dev: round_to(confidence_std_dev, 3),
        entropy_bits: round_to(entropy_bits, 3),
        dominant_ratio: round_to(dominant_ratio, 3),
        peak_confidence: round_to(peak_confidence, 3),
        shift_duration_secs: round_to(shift_duration_secs, 2),
    }
}

pub fn round_to(value: f32, places: u32) -> f32 {
    let factor = 10f32.powi(places as i32);
    (value * factor).round() / factor
}
