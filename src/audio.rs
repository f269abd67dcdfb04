use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Extracted audio ready for transcription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioInfo {
    pub path: PathBuf,
    pub duration: Duration,
    pub sample_rate: u32,
    pub channels: u32,
}

/// Audio extractor producing mono WAV suitable for Whisper
#[derive(Debug, Clone)]
pub struct AudioExtractor {
    /// Target sample rate for transcription
    pub target_sample_rate: u32,
}

impl AudioExtractor {
    pub fn new(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    /// Extract the audio track of a video into `work_dir` as mono PCM WAV.
    ///
    /// The output lives in the request-scoped workspace and is deleted
    /// with it, whatever the outcome of the request.
    pub async fn extract_for_transcription(
        &self,
        video_path: &Path,
        work_dir: &Path,
    ) -> Result<AudioInfo> {
        let filename = video_path
            .file_stem()
            .ok_or_else(|| anyhow!("Invalid video filename"))?
            .to_string_lossy();

        let audio_path = work_dir.join(format!("{}.wav", filename));

        info!("Extracting audio for transcription: {}", video_path.display());

        let status = tokio::process::Command::new("ffmpeg")
            .args([
                "-i",
                video_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Non-UTF8 video path"))?,
                "-vn", // No video stream
                "-acodec",
                "pcm_s16le", // 16-bit PCM
                "-ar",
                &self.target_sample_rate.to_string(),
                "-ac",
                "1", // Mono channel
                "-f",
                "wav",
                "-y",
                audio_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Non-UTF8 audio path"))?,
            ])
            .status()
            .await?;

        if !status.success() {
            return Err(anyhow!(
                "Audio extraction failed for {}",
                video_path.display()
            ));
        }

        let audio_info = self.get_audio_info(&audio_path).await?;

        info!(
            "Audio extracted: {} ({:.1}s, {}Hz)",
            audio_info.path.display(),
            audio_info.duration.as_secs_f64(),
            audio_info.sample_rate
        );

        Ok(audio_info)
    }

    /// Probe an audio file with ffprobe
    pub async fn get_audio_info(&self, audio_path: &Path) -> Result<AudioInfo> {
        let output = tokio::process::Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-select_streams",
                "a:0", // First audio stream
                audio_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Non-UTF8 audio path"))?,
            ])
            .output()
            .await?;

        if !output.status.success() {
            return Err(anyhow!("ffprobe failed for {}", audio_path.display()));
        }

        let ffprobe_data: serde_json::Value = serde_json::from_slice(&output.stdout)?;

        let audio_stream = ffprobe_data["streams"]
            .as_array()
            .and_then(|streams| streams.first())
            .ok_or_else(|| anyhow!("No audio stream found in {}", audio_path.display()))?;

        let duration_seconds: f64 = ffprobe_data["format"]["duration"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(AudioInfo {
            path: audio_path.to_path_buf(),
            duration: Duration::from_secs_f64(duration_seconds),
            sample_rate: audio_stream["sample_rate"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or(self.target_sample_rate),
            channels: audio_stream["channels"].as_u64().unwrap_or(1) as u32,
        })
    }
}

impl Default for AudioExtractor {
    fn default() -> Self {
        Self::new(16000) // 16kHz optimal for Whisper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_extractor_defaults() {
        let extractor = AudioExtractor::default();
        assert_eq!(extractor.target_sample_rate, 16000);
    }

    #[tokio::test]
    async fn test_extract_rejects_missing_stem() {
        let extractor = AudioExtractor::default();
        let dir = tempfile::tempdir().unwrap();

        let result = extractor
            .extract_for_transcription(Path::new(".."), dir.path())
            .await;
        assert!(result.is_err());
    }
}
