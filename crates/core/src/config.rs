use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_DURATION_SECS: f32 = 5.0;
pub const DEFAULT_OVERLAP: f32 = 0.5;
pub const DEFAULT_TOP_DB: f32 = 30.0;
pub const DEFAULT_TARGET_SAMPLE_RATE: u32 = 16_000;

/// Signals shorter than this after preprocessing are rejected.
pub const MIN_AUDIO_SECS: f32 = 0.5;
/// Trailing windows shorter than this are discarded.
pub const MIN_WINDOW_SECS: f32 = 1.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("chunk duration must be > 0 seconds")]
    NonPositiveChunkDuration,
    #[error("overlap must be in [0, 1), got {0}")]
    OverlapOutOfRange(f32),
    #[error("silence threshold (top_db) must be > 0 dB")]
    NonPositiveTopDb,
}

/// Windowing and silence-trimming parameters shared by the segmenter and
/// the signal-metrics extractor.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChunkingConfig {
    chunk_duration_secs: f32,
    overlap: f32,
    top_db: f32,
}

impl ChunkingConfig {
    pub fn new(chunk_duration_secs: f32, overlap: f32, top_db: f32) -> Result<Self, ConfigError> {
        if !(chunk_duration_secs > 0.0) {
            return Err(ConfigError::NonPositiveChunkDuration);
        }
        if !(0.0..1.0).contains(&overlap) {
            return Err(ConfigError::OverlapOutOfRange(overlap));
        }
        if !(top_db > 0.0) {
            return Err(ConfigError::NonPositiveTopDb);
        }
        Ok(Self {
            chunk_duration_secs,
            overlap,
            top_db,
        })
    }

    pub fn chunk_duration_secs(&self) -> f32 {
        self.chunk_duration_secs
    }

    pub fn overlap(&self) -> f32 {
        self.overlap
    }

    pub fn top_db(&self) -> f32 {
        self.top_db
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: DEFAULT_CHUNK_DURATION_SECS,
            overlap: DEFAULT_OVERLAP,
            top_db: DEFAULT_TOP_DB,
        }
    }
}
