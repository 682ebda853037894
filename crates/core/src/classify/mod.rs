mod prosody;

use crate::segment::Window;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use prosody::ProsodyFrameClassifier;

/// Tolerance when checking that a distribution sums to 1.
pub const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

/// Fixed emotion vocabulary. Enumeration order is the tie-break order for
/// aggregation, so the variants are deliberately kept in this sequence.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Calm,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgust,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 8] = [
        Emotion::Neutral,
        Emotion::Calm,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgust,
        Emotion::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Calm => "calm",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgust => "disgust",
            Emotion::Surprised => "surprised",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One window's labeled probability distribution. Created once per window
/// by a classifier, immutable afterward.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub emotion: Emotion,
    pub confidence: f32,
    pub distribution: BTreeMap<Emotion, f32>,
    pub window_index: usize,
    pub start_time_secs: f32,
}

impl ClassificationResult {
    /// Builds a result from raw per-label scores: normalizes them into a
    /// probability distribution and picks the argmax (ties resolve to the
    /// earliest label in enumeration order).
    pub fn from_scores(
        scores: BTreeMap<Emotion, f32>,
        window: &Window,
    ) -> Result<Self, ClassifyError> {
        let total: f32 = scores.values().sum();
        if !(total > 0.0) {
            return Err(ClassifyError::DegenerateScores);
        }
        let distribution: BTreeMap<Emotion, f32> =
            scores.into_iter().map(|(e, s)| (e, s / total)).collect();

        let mut emotion = Emotion::Neutral;
        let mut confidence = f32::MIN;
        for (&e, &p) in &distribution {
            if p > confidence {
                emotion = e;
                confidence = p;
            }
        }

        Ok(Self {
            emotion,
            confidence,
            distribution,
            window_index: window.index,
            start_time_secs: window.start_time_secs,
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("window contains no samples")]
    MalformedWindow,
    #[error("classifier produced non-positive scores")]
    DegenerateScores,
    #[error("classifier backend failed: {0}")]
    Backend(String),
}

/// Maps one audio window to a labeled probability distribution over the
/// fixed emotion vocabulary. Backends plug in behind this trait; the
/// pipeline owns an injected instance rather than a process-wide global.
pub trait FrameClassifier: Send + Sync {
    fn classify(
        &self,
        window: &Window,
    ) -> BoxFuture<'_, Result<ClassificationResult, ClassifyError>>;

    fn vocabulary(&self) -> &'static [Emotion] {
        &Emotion::ALL
    }
}
