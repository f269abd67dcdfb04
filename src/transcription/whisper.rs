use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{TranscriptSegment, TranscriptionService};
use crate::audio::AudioInfo;
use crate::config::TranscriptionConfig;

/// Whisper backend resolved at first use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WhisperBackend {
    /// whisper.cpp (`whisper-cli` or `whisper-cpp`)
    Cpp(&'static str),
    /// Python OpenAI Whisper (fallback)
    Python,
}

/// Transcriber shelling out to a local Whisper installation.
///
/// Backend detection happens at most once per process; concurrent first
/// callers race on the probe and every later call reuses the cached
/// result, mirroring a lazily-initialized model handle.
pub struct WhisperTranscriber {
    config: TranscriptionConfig,
    backend: OnceCell<WhisperBackend>,
}

impl WhisperTranscriber {
    pub fn new(config: TranscriptionConfig) -> Self {
        Self {
            config,
            backend: OnceCell::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Detect the fastest available Whisper backend
    async fn detect_backend() -> Result<WhisperBackend> {
        let candidates = [
            ("whisper-cli", WhisperBackend::Cpp("whisper-cli")),
            ("whisper-cpp", WhisperBackend::Cpp("whisper-cpp")),
            ("whisper", WhisperBackend::Python),
        ];

        for (cmd_name, backend) in candidates {
            if Self::check_command_available(cmd_name).await {
                info!("Using Whisper backend: {}", cmd_name);
                return Ok(backend);
            }
            debug!("Whisper backend {} not available", cmd_name);
        }

        Err(anyhow!(
            "No Whisper backend found. Install whisper.cpp or openai-whisper"
        ))
    }

    async fn check_command_available(cmd_name: &str) -> bool {
        Command::new(cmd_name)
            .arg("--help")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Check whether any Whisper backend is installed
    pub async fn check_availability() -> Result<String> {
        Self::detect_backend()
            .await
            .map(|backend| format!("{:?} backend available", backend))
    }

    async fn run_whisper_cpp(
        &self,
        cmd_name: &str,
        audio_path: &Path,
        work_dir: &Path,
    ) -> Result<PathBuf> {
        let base_name = audio_path
            .file_stem()
            .ok_or_else(|| anyhow!("Invalid audio filename"))?
            .to_string_lossy()
            .to_string();
        let output_file = work_dir.join(&base_name);

        let mut cmd = Command::new(cmd_name);
        cmd.arg("-f")
            .arg(audio_path)
            .arg("-oj") // JSON output
            .arg("-of")
            .arg(&output_file)
            .arg("-m")
            .arg(format!("models/ggml-{}.bin", self.config.model))
            .arg("-tp")
            .arg(self.config.temperature.to_string());

        if let Some(language) = &self.config.language {
            cmd.arg("-l").arg(language);
        }

        self.execute(cmd, cmd_name).await?;
        Ok(output_file.with_extension("json"))
    }

    async fn run_python_whisper(&self, audio_path: &Path, work_dir: &Path) -> Result<PathBuf> {
        let base_name = audio_path
            .file_stem()
            .ok_or_else(|| anyhow!("Invalid audio filename"))?
            .to_string_lossy()
            .to_string();

        let mut cmd = Command::new("whisper");
        cmd.arg(audio_path)
            .arg("--model")
            .arg(&self.config.model)
            .arg("--output_dir")
            .arg(work_dir)
            .arg("--output_format")
            .arg("json")
            .arg("--verbose")
            .arg("False")
            .arg("--fp16")
            .arg("False")
            .arg("--temperature")
            .arg(self.config.temperature.to_string());

        if let Some(language) = &self.config.language {
            cmd.arg("--language").arg(language);
        }

        self.execute(cmd, "whisper").await?;
        Ok(work_dir.join(format!("{}.json", base_name)))
    }

    /// Execute a backend command under the configured timeout
    async fn execute(&self, mut cmd: Command, backend_name: &str) -> Result<()> {
        let timeout = Duration::from_secs(self.config.timeout as u64);
        debug!("Executing {} command: {:?}", backend_name, cmd);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| {
                anyhow!(
                    "{} timed out after {} seconds",
                    backend_name,
                    self.config.timeout
                )
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "{} failed with exit code {}: {}",
                backend_name,
                output.status,
                stderr.trim()
            ));
        }

        Ok(())
    }

    /// Parse segments out of a Whisper JSON output file.
    ///
    /// Handles both the whisper.cpp shape (`transcription` array with
    /// millisecond offsets) and the Python shape (`segments` array with
    /// float seconds).
    fn parse_output(json_content: &str) -> Result<Vec<TranscriptSegment>> {
        let output: WhisperOutput = serde_json::from_str(json_content)
            .map_err(|e| anyhow!("Failed to parse Whisper JSON output: {}", e))?;

        let segments = if !output.transcription.is_empty() {
            output
                .transcription
                .into_iter()
                .map(|seg| TranscriptSegment {
                    start: seg.offsets.from as f64 / 1000.0,
                    end: seg.offsets.to as f64 / 1000.0,
                    text: seg.text.trim().to_string(),
                })
                .collect()
        } else {
            output
                .segments
                .into_iter()
                .map(|seg| TranscriptSegment {
                    start: seg.start,
                    end: seg.end,
                    text: seg.text.trim().to_string(),
                })
                .collect()
        };

        Ok(segments)
    }
}

#[async_trait]
impl TranscriptionService for WhisperTranscriber {
    async fn transcribe(&self, audio: &AudioInfo, work_dir: &Path) -> Result<Vec<TranscriptSegment>> {
        let backend = *self
            .backend
            .get_or_try_init(Self::detect_backend)
            .await?;

        info!(
            "Transcribing {} ({:.1}s, {}Hz) with model {}",
            audio.path.display(),
            audio.duration.as_secs_f64(),
            audio.sample_rate,
            self.config.model
        );

        let json_path = match backend {
            WhisperBackend::Cpp(cmd_name) => {
                self.run_whisper_cpp(cmd_name, &audio.path, work_dir).await?
            }
            WhisperBackend::Python => self.run_python_whisper(&audio.path, work_dir).await?,
        };

        if !json_path.exists() {
            return Err(anyhow!(
                "Whisper produced no JSON output at {}",
                json_path.display()
            ));
        }

        let json_content = tokio::fs::read_to_string(&json_path).await?;
        let segments = Self::parse_output(&json_content)?;

        if segments.is_empty() {
            warn!("Transcription produced no segments for {}", audio.path.display());
        } else {
            info!("Transcription produced {} segments", segments.len());
        }

        Ok(segments)
    }
}

/// Whisper JSON output, covering both backend shapes
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[serde(default)]
    segments: Vec<PythonSegment>,
    #[serde(default)]
    transcription: Vec<CppSegment>,
}

#[derive(Debug, Deserialize)]
struct PythonSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct CppSegment {
    offsets: CppOffsets,
    text: String,
}

#[derive(Debug, Deserialize)]
struct CppOffsets {
    from: u64,
    to: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscriptionConfig;

    fn test_config() -> TranscriptionConfig {
        TranscriptionConfig {
            model: "small".to_string(),
            language: None,
            timeout: 300,
            temperature: 0.0,
            lexicon_file: None,
        }
    }

    #[test]
    fn test_transcriber_creation() {
        let transcriber = WhisperTranscriber::new(test_config());
        assert_eq!(transcriber.model(), "small");
    }

    #[test]
    fn test_parse_python_whisper_output() {
        let json = r#"{
            "text": "great save what a goal",
            "segments": [
                {"id": 0, "start": 0.0, "end": 3.2, "text": " great save "},
                {"id": 1, "start": 10.5, "end": 13.0, "text": "what a goal"}
            ]
        }"#;

        let segments = WhisperTranscriber::parse_output(json).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "great save");
        assert_eq!(segments[1].start, 10.5);
    }

    #[test]
    fn test_parse_whisper_cpp_output() {
        let json = r#"{
            "transcription": [
                {
                    "timestamps": {"from": "00:00:00,000", "to": "00:00:03,500"},
                    "offsets": {"from": 0, "to": 3500},
                    "text": " penalty kick coming up"
                }
            ]
        }"#;

        let segments = WhisperTranscriber::parse_output(json).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start, 0.0);
        assert_eq!(segments[0].end, 3.5);
        assert_eq!(segments[0].text, "penalty kick coming up");
    }

    #[test]
    fn test_parse_invalid_output() {
        assert!(WhisperTranscriber::parse_output("not json").is_err());
    }
}
