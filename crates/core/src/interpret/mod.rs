//! Maps numeric signal and stability metrics onto qualitative labels and a
//! composed one-sentence summary. Pure lookup tables, no learned behavior.

use crate::classify::Emotion;
use crate::metrics::ObjectiveMetrics;
use crate::signal::AudioMetrics;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Interpretation {
    pub pitch_level: String,
    pub speaking_rate: String,
    pub volume: String,
    pub fluency: String,
    pub emotion_consistency: String,
    pub emotional_diversity: String,
    pub overall_summary: String,
}

pub fn interpret(
    objective: &ObjectiveMetrics,
    audio: &AudioMetrics,
    dominant_emotion: Emotion,
    avg_confidence: f32,
) -> Interpretation {
    let speaking_rate = speaking_rate_label(audio.estimated_wpm);
    let volume = volume_label(audio.mean_energy_db);
    let emotion_consistency = consistency_label(objective.stability);

    let overall_summary = format!(
        "Dominant emotion is {dominant_emotion} at {:.0}% average confidence; \
         delivery is {speaking_rate} paced, {volume} in volume, and emotionally {emotion_consistency}.",
        avg_confidence * 100.0
    );

    Interpretation {
        pitch_level: pitch_label(audio.mean_pitch_hz).to_owned(),
        speaking_rate: speaking_rate.to_owned(),
        volume: volume.to_owned(),
        fluency: fluency_label(audio.speech_ratio).to_owned(),
        emotion_consistency: emotion_consistency.to_owned(),
        emotional_diversity: diversity_label(objective.entropy_bits).to_owned(),
        overall_summary,
    }
}

pub fn pitch_label(mean_pitch_hz: f32) -> &'static str {
    if mean_pitch_hz <= 0.0 {
        "unable to detect"
    } else if mean_pitch_hz < 85.0 {
        "very low"
    } else if mean_pitch_hz < 165.0 {
        "low"
    } else if mean_pitch_hz < 255.0 {
        "medium"
    } else {
        "high"
    }
}

pub fn speaking_rate_label(wpm: f32) -> &'static str {
    if wpm < 100.0 {
        "slow"
    } else if wpm < 150.0 {
        "normal"
    } else if wpm < 180.0 {
        "fast"
    } else {
        "very fast"
    }
}

pub fn volume_label(mean_energy_db: f32) -> &'static str {
    if mean_energy_db > -20.0 {
        "loud"
    } else if mean_energy_db > -30.0 {
        "normal"
    } else {
        "quiet"
    }
}

pub fn fluency_label(speech_ratio: f32) -> &'static str {
    if speech_ratio > 0.8 {
        "high fluency"
    } else if speech_ratio > 0.6 {
        "good fluency"
    } else {
        "many pauses"
    }
}

pub fn consistency_label(stability: f32) -> &'static str {
    if stability > 0.8 {
        "very stable"
    } else if stability > 0.6 {
        "moderately stable"
    } else {
        "variable"
    }
}

pub fn diversity_label(entropy_bits: f32) -> &'static str {
    if entropy_bits < 0.5 {
        "single dominant emotion"
    } else if entropy_bits < 1.0 {
        "low emotional diversity"
    } else {
        "high emotional diversity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_thresholds() {
        assert_eq!(pitch_label(0.0), "unable to detect");
        assert_eq!(pitch_label(84.9), "very low");
        assert_eq!(pitch_label(85.0), "low");
        assert_eq!(pitch_label(165.0), "medium");
        assert_eq!(pitch_label(255.0), "high");
    }

    #[test]
    fn speaking_rate_thresholds() {
        assert_eq!(speaking_rate_label(99.9), "slow");
        assert_eq!(speaking_rate_label(100.0), "normal");
        assert_eq!(speaking_rate_label(150.0), "fast");
        assert_eq!(speaking_rate_label(180.0), "very fast");
    }

    #[test]
    fn volume_thresholds() {
        assert_eq!(volume_label(-19.9), "loud");
        assert_eq!(volume_label(-20.0), "normal");
        assert_eq!(volume_label(-30.0), "quiet");
    }

    #[test]
    fn fluency_thresholds() {
        assert_eq!(fluency_label(0.81), "high fluency");
        assert_eq!(fluency_label(0.8), "good fluency");
        assert_eq!(fluency_label(0.6), "many pauses");
    }

    #[test]
    fn consistency_thresholds() {
        assert_eq!(consistency_label(0.81), "very stable");
        assert_eq!(consistency_label(0.8), "moderately stable");
        assert_eq!(consistency_label(0.6), "variable");
    }

    #[test]
    fn diversity_thresholds() {
        assert_eq!(diversity_label(0.49), "single dominant emotion");
        assert_eq!(diversity_label(0.5), "low emotional diversity");
        assert_eq!(diversity_label(1.0), "high emotional diversity");
    }

    #[test]
    fn summary_interpolates_in_fixed_order() {
        let objective = ObjectiveMetrics {
            stability: 0.9,
            confidence_std_dev: 0.05,
            entropy_bits: 0.3,
            dominant_ratio: 0.9,
            peak_confidence: 0.95,
            shift_duration_secs: 0.0,
        };
        let audio = AudioMetrics {
            duration_secs: 12.0,
            mean_pitch_hz: 180.0,
            mean_energy_db: -35.0,
            estimated_wpm: 120.0,
            speech_ratio: 0.85,
            speech_duration_secs: 10.2,
            silence_duration_secs: 1.8,
            pause_count: 1,
            ..AudioMetrics::default()
        };
        let out = interpret(&objective, &audio, Emotion::Happy, 0.85);
        let summary = &out.overall_summary;

        let order = ["happy", "85%", "normal", "quiet", "very stable"];
        let mut last = 0;
        for needle in order {
            let at = summary[last..]
                .find(needle)
                .unwrap_or_else(|| panic!("missing {needle:?} in {summary:?}"));
            last += at + needle.len();
        }
        assert_eq!(out.pitch_level, "medium");
        assert_eq!(out.fluency, "high fluency");
        assert_eq!(out.emotional_diversity, "single dominant emotion");
    }
}
