//! Combines ordered per-window classification results into a single
//! dominant-emotion verdict, a normalized distribution and a time-ordered
//! emotion timeline.

use crate::classify::{ClassificationResult, Emotion};
use crate::metrics::round_to;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("no valid windows to aggregate")]
    NoValidWindows,
}

/// One point of the emotion timeline, chronological order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub time_secs: f32,
    pub emotion: Emotion,
    pub confidence: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AggregateVerdict {
    pub dominant_emotion: Emotion,
    /// Mean confidence of only the windows predicting the dominant emotion.
    pub avg_confidence: f32,
    /// Percentage share per label; exact internally so downstream
    /// statistics see full precision, rounded to two decimals on the wire.
    #[serde(serialize_with = "serialize_pct_rounded")]
    pub distribution_pct: BTreeMap<Emotion, f32>,
    pub timeline: Vec<TimelineEntry>,
}

/// Weights each label by the sum of confidences of the windows predicting
/// it, so confident predictions outweigh frequent-but-uncertain ones.
/// Weight ties resolve to the earliest label in enumeration order.
pub fn aggregate(results: &[ClassificationResult]) -> Result<AggregateVerdict, AggregateError> {
    if results.is_empty() {
        return Err(AggregateError::NoValidWindows);
    }

    let mut weights: BTreeMap<Emotion, f32> = BTreeMap::new();
    for result in results {
        *weights.entry(result.emotion).or_insert(0.0) += result.confidence;
    }
    let total_weight: f32 = weights.values().sum();

    let mut dominant_emotion = Emotion::Neutral;
    let mut dominant_weight = f32::MIN;
    for (&emotion, &weight) in &weights {
        if weight > dominant_weight {
            dominant_emotion = emotion;
            dominant_weight = weight;
        }
    }

    let distribution_pct: BTreeMap<Emotion, f32> = weights
        .iter()
        .map(|(&emotion, &weight)| {
            let pct = if total_weight > 0.0 {
                100.0 * weight / total_weight
            } else {
                0.0
            };
            (emotion, pct)
        })
        .collect();

    let dominant_confidences: Vec<f32> = results
        .iter()
        .filter(|r| r.emotion == dominant_emotion)
        .map(|r| r.confidence)
        .collect();
    let avg_confidence = if dominant_confidences.is_empty() {
        0.0
    } else {
        dominant_confidences.iter().sum::<f32>() / dominant_confidences.len() as f32
    };

    let timeline: Vec<TimelineEntry> = results
        .iter()
        .map(|r| TimelineEntry {
            time_secs: r.start_time_secs,
            emotion: r.emotion,
            confidence: r.confidence,
        })
        .collect();

    Ok(AggregateVerdict {
        dominant_emotion,
        avg_confidence: round_to(avg_confidence, 3),
        distribution_pct,
        timeline,
    })
}

fn serialize_pct_rounded<S>(
    map: &BTreeMap<Emotion, f32>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let rounded: BTreeMap<Emotion, f32> =
        map.iter().map(|(&e, &pct)| (e, round_to(pct, 2))).collect();
    rounded.serialize(serializer)
}
