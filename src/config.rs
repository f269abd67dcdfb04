use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the sports highlight extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Clip selection and window settings
    pub clips: ClipConfig,

    /// Audio extraction settings
    pub audio: AudioConfig,

    /// Transcription service settings
    pub transcription: TranscriptionConfig,

    /// HTTP server settings
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipConfig {
    /// Length of each highlight clip in seconds
    pub clip_duration_seconds: f64,

    /// Merge overlapping clip windows before assembly.
    /// Off by default: triggers closer together than the clip duration
    /// then produce duplicated footage in the output.
    pub merge_overlapping: bool,

    /// Encoder preset for clip assembly
    pub encoder_preset: String,

    /// Number of encoder threads (0 = auto-detect from CPU count)
    pub encoder_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Target sample rate for transcription
    pub target_sample_rate: u32,

    /// Target audio format
    pub target_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Whisper model to use
    pub model: String,

    /// Language hint for transcription (None = auto-detect)
    pub language: Option<String>,

    /// Timeout for a transcription run (seconds)
    pub timeout: u32,

    /// Temperature setting for Whisper (0.0 = deterministic)
    pub temperature: f32,

    /// Optional lexicon file overriding the built-in sport keywords
    pub lexicon_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Maximum upload size in megabytes
    pub max_upload_mb: usize,
}

impl Config {
    /// Load configuration from file, falling back to environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = [
            "sports-highlighter.toml",
            "config/sports-highlighter.toml",
            "/etc/sports-highlighter/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Build configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(duration) = std::env::var("HIGHLIGHTER_CLIP_DURATION") {
            config.clips.clip_duration_seconds = duration.parse().unwrap_or(10.0);
        }

        if let Ok(model) = std::env::var("HIGHLIGHTER_WHISPER_MODEL") {
            config.transcription.model = model;
        }

        if let Ok(port) = std::env::var("HIGHLIGHTER_PORT") {
            config.server.port = port.parse().unwrap_or(5000);
        }

        if let Ok(lexicon) = std::env::var("HIGHLIGHTER_LEXICON_FILE") {
            config.transcription.lexicon_file = Some(PathBuf::from(lexicon));
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.clips.clip_duration_seconds <= 0.0 {
            return Err(anyhow!("clip_duration_seconds must be greater than 0"));
        }

        if self.audio.target_sample_rate == 0 {
            return Err(anyhow!("target_sample_rate must be greater than 0"));
        }

        if self.transcription.model.is_empty() {
            return Err(anyhow!("transcription model must not be empty"));
        }

        if self.server.max_upload_mb == 0 {
            return Err(anyhow!("max_upload_mb must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clips: ClipConfig {
                clip_duration_seconds: 10.0,
                merge_overlapping: false,
                encoder_preset: "ultrafast".to_string(),
                encoder_threads: num_cpus::get().min(8),
            },
            audio: AudioConfig {
                target_sample_rate: 16000, // Optimal for Whisper
                target_format: "wav".to_string(),
            },
            transcription: TranscriptionConfig {
                model: "small".to_string(),
                language: None,
                timeout: 3600, // 60 minutes for large files
                temperature: 0.0,
                lexicon_file: None,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_upload_mb: 512,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.clips.clip_duration_seconds, 10.0);
        assert!(!config.clips.merge_overlapping);
        assert_eq!(config.audio.target_sample_rate, 16000);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad = Config::default();
        bad.clips.clip_duration_seconds = 0.0;
        assert!(bad.validate().is_err());
    }
}
