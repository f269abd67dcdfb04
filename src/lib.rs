/// Sports Highlighter - Rust Implementation
///
/// Extracts highlight clips from sports videos by transcribing the audio
/// track, matching transcript segments against a sport-specific keyword
/// lexicon, and re-assembling the matched time windows into one
/// downloadable clip.

pub mod api;
pub mod assembler;
pub mod audio;
pub mod config;
pub mod highlights;
pub mod lexicon;
pub mod pipeline;
pub mod transcription;
pub mod video;

// Re-export main types for easy access
pub use crate::assembler::{ClipAssembler, FfmpegAssembler};
pub use crate::audio::{AudioExtractor, AudioInfo};
pub use crate::config::Config;
pub use crate::highlights::{build_windows, merge_windows, select_triggers, ClipWindow};
pub use crate::lexicon::{KeywordSet, SportLexicon};
pub use crate::pipeline::{AssembledClip, HighlightError, HighlightPipeline};
pub use crate::transcription::{TranscriptSegment, TranscriptionService, WhisperTranscriber};
pub use crate::video::{VideoInfo, VideoProcessor};
