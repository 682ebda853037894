//! Orchestrates the full analysis: segment, classify windows strictly in
//! order, aggregate, derive objective metrics, optionally attach signal
//! metrics and interpretation. Stateless per run; the classifier instance
//! is injected by the composition root.

use crate::aggregate::{self, AggregateError, AggregateVerdict};
use crate::audio::Waveform;
use crate::classify::{ClassificationResult, ClassifyError, FrameClassifier};
use crate::config::ChunkingConfig;
use crate::interpret::{self, Interpretation};
use crate::metrics::{self, ObjectiveMetrics};
use crate::segment::{SegmentError, Segmenter, Window};
use crate::signal::{self, AudioMetrics};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error("classification failed: {0}")]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Aggregated verdict plus timeline statistics for one run.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AnalysisReport {
    pub verdict: AggregateVerdict,
    pub objective_metrics: ObjectiveMetrics,
    pub windows_total: usize,
    pub windows_failed: usize,
    pub used_fallback: bool,
}

/// Long-audio report extended with whole-utterance signal metrics and the
/// qualitative interpretation.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CompleteReport {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub audio_metrics: AudioMetrics,
    pub interpretation: Interpretation,
}

pub struct EmotionPipeline<C> {
    classifier: C,
    config: ChunkingConfig,
}

impl<C: FrameClassifier> EmotionPipeline<C> {
    pub fn new(classifier: C, config: ChunkingConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Whole-file single-shot classification, no windowing.
    pub async fn analyze_single(
        &self,
        waveform: &Waveform,
    ) -> Result<ClassificationResult, PipelineError> {
        let window = whole_file_window(waveform);
        Ok(self.classifier.classify(&window).await?)
    }

    /// Full long-audio pipeline. A failed window is logged and skipped;
    /// if every window fails, falls back to whole-file classification
    /// before giving up.
    pub async fn analyze_long(
        &self,
        waveform: &Waveform,
        remove_silence: bool,
    ) -> Result<AnalysisReport, PipelineError> {
        let segmenter = Segmenter::new(self.config);
        let windows = segmenter.preprocess(waveform, remove_silence)?;
        let windows_total = windows.len();

        let mut results: Vec<ClassificationResult> = Vec::with_capacity(windows_total);
        for window in &windows {
            match self.classifier.classify(window).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(
                        window = window.index,
                        start_secs = window.start_time_secs,
                        error = %e,
                        "window classification failed, skipping"
                    );
                }
            }
        }
        let windows_failed = windows_total - results.len();

        let mut used_fallback = false;
        if results.is_empty() {
            tracing::warn!(
                windows_total,
                "every window failed classification, falling back to whole-file analysis"
            );
            results.push(self.analyze_single(waveform).await?);
            used_fallback = true;
        }

        let verdict = aggregate::aggregate(&results)?;
        let objective_metrics = metrics::compute(
            &verdict.timeline,
            &verdict.distribution_pct,
            verdict.dominant_emotion,
            self.config.chunk_duration_secs(),
        );

        tracing::info!(
            dominant = %verdict.dominant_emotion,
            avg_confidence = verdict.avg_confidence,
            windows_total,
            windows_failed,
            "analysis complete"
        );

        Ok(AnalysisReport {
            verdict,
            objective_metrics,
            windows_total,
            windows_failed,
            used_fallback,
        })
    }

    /// Long-audio pipeline plus signal metrics and interpretation. A
    /// failed metrics extraction degrades to defaults rather than failing
    /// the whole analysis.
    pub async fn analyze_complete(
        &self,
        waveform: &Waveform,
        remove_silence: bool,
    ) -> Result<CompleteReport, PipelineError> {
        let report = self.analyze_long(waveform, remove_silence).await?;

        let audio_metrics = match signal::extract(waveform, self.config.top_db()) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "audio metrics extraction failed, using defaults");
                AudioMetrics::default()
            }
        };

        let interpretation = interpret::interpret(
            &report.objective_metrics,
            &audio_metrics,
            report.verdict.dominant_emotion,
            report.verdict.avg_confidence,
        );

        Ok(CompleteReport {
            report,
            audio_metrics,
            interpretation,
        })
    }
}

fn whole_file_window(waveform: &Waveform) -> Window {
    Window {
        index: 0,
        start_time_secs: 0.0,
        sample_rate: waveform.sample_rate,
        samples: waveform.samples.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Emotion;
    use futures::FutureExt;
    use std::collections::BTreeMap;

    const SR: u32 = 16_000;

    fn tone(duration_secs: f32) -> Waveform {
        let n = (duration_secs * SR as f32) as usize;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 220.0 * i as f32 / SR as f32).sin())
            .collect();
        Waveform::new(samples, SR).expect("valid waveform")
    }

    /// Scripted test double: emotion alternates by window index, and any
    /// window shorter than `fail_below_secs` fails.
    struct ScriptedClassifier {
        fail_below_secs: f32,
    }

    impl ScriptedClassifier {
        fn passing() -> Self {
            Self {
                fail_below_secs: 0.0,
            }
        }

        fn failing_windows() -> Self {
            // Fails anything shorter than the fallback whole-file window.
            Self {
                fail_below_secs: 6.0,
            }
        }

        fn failing_all() -> Self {
            Self {
                fail_below_secs: f32::MAX,
            }
        }
    }

    impl FrameClassifier for ScriptedClassifier {
        fn classify(
            &self,
            window: &Window,
        ) -> futures::future::BoxFuture<'_, Result<ClassificationResult, ClassifyError>> {
            let result = if window.duration_secs() < self.fail_below_secs {
                Err(ClassifyError::Backend("scripted failure".to_owned()))
            } else {
                let emotion = if window.index % 2 == 0 {
                    Emotion::Happy
                } else {
                    Emotion::Sad
                };
                let mut distribution = BTreeMap::new();
                distribution.insert(emotion, 0.9);
                distribution.insert(Emotion::Neutral, 0.1);
                Ok(ClassificationResult {
                    emotion,
                    confidence: 0.9,
                    distribution,
                    window_index: window.index,
                    start_time_secs: window.start_time_secs,
                })
            };
            futures::future::ready(result).boxed()
        }
    }

    #[tokio::test]
    async fn analyze_single_covers_whole_file() {
        let pipeline =
            EmotionPipeline::new(ScriptedClassifier::passing(), ChunkingConfig::default());
        let result = pipeline.analyze_single(&tone(3.0)).await.expect("analyzed");
        assert_eq!(result.window_index, 0);
        assert_eq!(result.start_time_secs, 0.0);
    }

    #[tokio::test]
    async fn analyze_long_produces_full_timeline() {
        let pipeline =
            EmotionPipeline::new(ScriptedClassifier::passing(), ChunkingConfig::default());
        let report = pipeline
            .analyze_long(&tone(12.0), false)
            .await
            .expect("analyzed");
        assert_eq!(report.windows_total, 4);
        assert_eq!(report.windows_failed, 0);
        assert!(!report.used_fallback);
        assert_eq!(report.verdict.timeline.len(), 4);
        // Two happy and two sad windows at equal confidence tie on
        // weight; the tie resolves to the earlier label in enum order.
        assert_eq!(report.verdict.dominant_emotion, Emotion::Happy);
    }

    #[tokio::test]
    async fn failed_windows_are_skipped_not_fatal() {
        // Default chunking of a 12s tone yields three 5s windows and one
        // 4.5s remainder; failing everything under 5s drops only the tail.
        let classifier = ScriptedClassifier {
            fail_below_secs: 5.0,
        };
        let pipeline = EmotionPipeline::new(classifier, ChunkingConfig::default());
        let report = pipeline
            .analyze_long(&tone(12.0), false)
            .await
            .expect("analyzed");
        assert_eq!(report.windows_total, 4);
        assert_eq!(report.windows_failed, 1);
        assert!(!report.used_fallback);
        assert_eq!(report.verdict.timeline.len(), 3);
    }

    #[tokio::test]
    async fn all_windows_failing_falls_back_to_whole_file() {
        let pipeline = EmotionPipeline::new(
            ScriptedClassifier::failing_windows(),
            ChunkingConfig::default(),
        );
        let report = pipeline
            .analyze_long(&tone(12.0), false)
            .await
            .expect("analyzed");
        assert_eq!(report.windows_total, 4);
        assert_eq!(report.windows_failed, 4);
        assert!(report.used_fallback);
        assert_eq!(report.verdict.timeline.len(), 1);
    }

    #[tokio::test]
    async fn fallback_failure_surfaces_classify_error() {
        let pipeline = EmotionPipeline::new(
            ScriptedClassifier::failing_all(),
            ChunkingConfig::default(),
        );
        let err = pipeline.analyze_long(&tone(12.0), false).await.unwrap_err();
        assert!(matches!(err, PipelineError::Classify(_)));
    }

    #[tokio::test]
    async fn too_short_audio_surfaces_segment_error() {
        let pipeline =
            EmotionPipeline::new(ScriptedClassifier::passing(), ChunkingConfig::default());
        let err = pipeline.analyze_long(&tone(0.3), false).await.unwrap_err();
        assert!(matches!(err, PipelineError::Segment(_)));
    }

    #[tokio::test]
    async fn complete_report_includes_interpretation() {
        let pipeline =
            EmotionPipeline::new(ScriptedClassifier::passing(), ChunkingConfig::default());
        let complete = pipeline
            .analyze_complete(&tone(12.0), false)
            .await
            .expect("analyzed");
        assert!(complete.audio_metrics.duration_secs > 11.0);
        assert!(complete
            .interpretation
            .overall_summary
            .contains(complete.report.verdict.dominant_emotion.as_str()));
    }
}
