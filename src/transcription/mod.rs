//! Transcription boundary.
//!
//! The pipeline only depends on the [`TranscriptionService`] trait: audio
//! in, ordered timed segments out. The production implementation shells
//! out to a local Whisper backend.

pub mod whisper;

pub use whisper::WhisperTranscriber;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::audio::AudioInfo;

/// One timed transcript segment.
///
/// Segments arrive ordered by start time as emitted by the transcription
/// service and are not re-sorted before keyword matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Transcribed text
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Speech-to-text capability injected into the pipeline at construction.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe the given audio file, writing any intermediate files
    /// into `work_dir` (scoped to one request, cleaned up by the caller).
    async fn transcribe(&self, audio: &AudioInfo, work_dir: &Path) -> Result<Vec<TranscriptSegment>>;
}
