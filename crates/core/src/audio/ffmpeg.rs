use super::{AudioError, AudioLoader, Result, Waveform};
use ffmpeg_sidecar::{download, paths::ffmpeg_path};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DECODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Decodes any ffmpeg-readable container into f32 mono PCM at the target
/// sample rate. Acts as the transcoding fallback for formats the usual
/// audio crates cannot read (WebM, Opus in Ogg, ...).
#[derive(Clone, Debug, Default)]
pub struct FfmpegAudioLoader;

impl FfmpegAudioLoader {
    pub fn new() -> Self {
        Self
    }

    fn ensure_ffmpeg_available(&self) -> Result<()> {
        download::auto_download().map_err(|e| AudioError::FfmpegUnavailable(e.to_string()))
    }

    fn parse_f32le_mono(raw: &[u8]) -> Result<Vec<f32>> {
        if raw.len() % 4 != 0 {
            return Err(AudioError::InvalidPcm(format!(
                "f32le byte length must be multiple of 4, got {}",
                raw.len()
            )));
        }
        let mut out = Vec::with_capacity(raw.len() / 4);
        for chunk in raw.chunks_exact(4) {
            out.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        Ok(out)
    }

    async fn decode_file(&self, path: &Path, target_sample_rate: u32) -> Result<Vec<f32>> {
        let output = tokio::process::Command::new(ffmpeg_path())
            .args([
                "-hide_banner",
                "-nostdin",
                "-loglevel",
                "error",
                "-i",
            ])
            .arg(path)
            .args([
                "-vn",
                "-sn",
                "-dn",
                "-ac",
                "1",
                "-ar",
                &target_sample_rate.to_string(),
                "-f",
                "f32le",
                "-acodec",
                "pcm_f32le",
                "pipe:1",
            ])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .output();

        let output = tokio::time::timeout(DECODE_TIMEOUT, output)
            .await
            .map_err(|_| AudioError::DecodeTimeout(DECODE_TIMEOUT))??;

        if !output.status.success() {
            let stderr_s = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(AudioError::UnsupportedFormat(format!(
                "ffmpeg exit_code={:?} stderr={stderr_s}",
                output.status.code()
            )));
        }

        let samples = Self::parse_f32le_mono(&output.stdout)?;
        if samples.is_empty() {
            return Err(AudioError::UnsupportedFormat(
                "no decodable audio stream in input".to_owned(),
            ));
        }
        Ok(samples)
    }
}

impl AudioLoader for FfmpegAudioLoader {
    fn load(&self, path: PathBuf, target_sample_rate: u32) -> BoxFuture<'_, Result<Waveform>> {
        async move {
            self.ensure_ffmpeg_available()?;
            let samples = self.decode_file(&path, target_sample_rate).await?;
            tracing::info!(
                path = %path.display(),
                sample_rate = target_sample_rate,
                samples = samples.len(),
                "audio decoded"
            );
            Waveform::new(samples, target_sample_rate)
        }
        .boxed()
    }
}
