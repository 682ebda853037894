use super::{ClassificationResult, ClassifyError, Emotion, FrameClassifier};
use crate::segment::Window;
use crate::signal;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeMap;

const HIGH_ENERGY_RMS: f32 = 0.1;
const LOW_ENERGY_RMS: f32 = 0.03;
const HIGH_PITCH_HZ: f32 = 200.0;
const LOW_PITCH_HZ: f32 = 110.0;
const HIGH_ZCR: f32 = 0.15;

/// Deterministic rule-based classifier over prosodic features (RMS energy,
/// mean pitch, zero-crossing rate). Intended as a reference backend and
/// test double; model-backed classifiers plug in through the same trait.
/// Same window in, same distribution out.
#[derive(Clone, Debug, Default)]
pub struct ProsodyFrameClassifier;

impl ProsodyFrameClassifier {
    pub fn new() -> Self {
        Self
    }

    fn score_window(&self, window: &Window) -> Result<BTreeMap<Emotion, f32>, ClassifyError> {
        if window.samples.is_empty() {
            return Err(ClassifyError::MalformedWindow);
        }

        let samples = &window.samples;
        let energy = (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
        let pitch = signal::mean_pitch_hz(samples, window.sample_rate)
            .map_err(|_| ClassifyError::MalformedWindow)?;
        let zcr = signal::zero_crossing_rate(samples);

        let mut scores: BTreeMap<Emotion, f32> =
            Emotion::ALL.iter().map(|&e| (e, 1.0)).collect();
        let mut boost = |emotion: Emotion, factor: f32| {
            if let Some(s) = scores.get_mut(&emotion) {
                *s *= factor;
            }
        };

        if energy > HIGH_ENERGY_RMS {
            boost(Emotion::Angry, 1.5);
            boost(Emotion::Happy, 1.3);
            boost(Emotion::Surprised, 1.2);
        } else if energy < LOW_ENERGY_RMS {
            boost(Emotion::Sad, 1.4);
            boost(Emotion::Calm, 1.3);
            boost(Emotion::Neutral, 1.2);
        }

        if pitch > HIGH_PITCH_HZ {
            boost(Emotion::Happy, 1.3);
            boost(Emotion::Surprised, 1.2);
            boost(Emotion::Fearful, 1.1);
        } else if pitch > 0.0 && pitch < LOW_PITCH_HZ {
            boost(Emotion::Sad, 1.3);
            boost(Emotion::Calm, 1.1);
        }

        if zcr > HIGH_ZCR {
            boost(Emotion::Fearful, 1.2);
            boost(Emotion::Disgust, 1.1);
        }

        Ok(scores)
    }
}

impl FrameClassifier for ProsodyFrameClassifier {
    fn classify(
        &self,
        window: &Window,
    ) -> BoxFuture<'_, Result<ClassificationResult, ClassifyError>> {
        let result = self
            .score_window(window)
            .and_then(|scores| ClassificationResult::from_scores(scores, window));
        futures::future::ready(result).boxed()
    }
}
