use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{info, warn};

use crate::assembler::ClipAssembler;
use crate::audio::AudioExtractor;
use crate::config::Config;
use crate::highlights::{build_windows, merge_windows, select_triggers, ClipWindow};
use crate::lexicon::{KeywordSet, SportLexicon};
use crate::transcription::{TranscriptSegment, TranscriptionService};
use crate::video::VideoProcessor;

/// Request-level failure taxonomy.
///
/// An unknown category is deliberately NOT an error: it degrades to an
/// empty keyword set (logged as a warning) and surfaces downstream as
/// `NoHighlightsFound`.
#[derive(Debug, Error)]
pub enum HighlightError {
    /// Missing or empty upload (client error)
    #[error("No file uploaded")]
    NoFileProvided,

    /// Selection produced zero clip windows; terminal, non-retryable
    #[error("No highlights found")]
    NoHighlightsFound,

    /// Any transcription or assembly failure, with the underlying cause
    #[error("Processing failed: {0}")]
    Processing(#[from] anyhow::Error),
}

impl HighlightError {
    /// HTTP status associated with this failure
    pub fn status_code(&self) -> u16 {
        match self {
            HighlightError::NoFileProvided => 400,
            HighlightError::NoHighlightsFound => 404,
            HighlightError::Processing(_) => 500,
        }
    }
}

/// Assembled highlight clip for one request.
///
/// Holds the request workspace open; dropping the clip deletes the
/// output file along with every intermediate artifact.
#[derive(Debug)]
pub struct AssembledClip {
    /// Path to the assembled clip inside the request workspace
    pub clip_path: PathBuf,
    /// Suggested download filename
    pub download_name: String,
    /// Number of clip windows that went into the assembly request
    pub window_count: usize,
    /// End-to-end processing time
    pub processing_time: Duration,
    _workspace: TempDir,
}

impl AssembledClip {
    /// Read the assembled clip into memory
    pub async fn read_bytes(&self) -> Result<Vec<u8>, HighlightError> {
        let bytes = tokio::fs::read(&self.clip_path)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(bytes)
    }
}

/// Orchestrates one request: resolve keywords, transcribe, select
/// triggers, build windows, assemble.
///
/// The transcription and assembly collaborators are injected at
/// construction and shared across requests; everything else is scoped to
/// a single run.
pub struct HighlightPipeline {
    config: Arc<Config>,
    lexicon: Arc<SportLexicon>,
    video: VideoProcessor,
    audio: AudioExtractor,
    transcriber: Arc<dyn TranscriptionService>,
    assembler: Arc<dyn ClipAssembler>,
}

impl HighlightPipeline {
    pub fn new(
        config: Arc<Config>,
        lexicon: Arc<SportLexicon>,
        transcriber: Arc<dyn TranscriptionService>,
        assembler: Arc<dyn ClipAssembler>,
    ) -> Self {
        let audio = AudioExtractor::new(config.audio.target_sample_rate);
        Self {
            config,
            lexicon,
            video: VideoProcessor::new(),
            audio,
            transcriber,
            assembler,
        }
    }

    pub fn lexicon(&self) -> &SportLexicon {
        &self.lexicon
    }

    /// Process one uploaded video into an assembled highlight clip.
    ///
    /// Every intermediate artifact (extracted audio, transcription
    /// output, per-window cuts) lives in a temp workspace that is
    /// released on all exit paths; on success it stays alive only as
    /// long as the returned [`AssembledClip`].
    pub async fn run(
        &self,
        source: &Path,
        category: &str,
        selected_moment: Option<&str>,
    ) -> Result<AssembledClip, HighlightError> {
        let started = Instant::now();

        let keywords = self.lexicon.resolve(category, selected_moment);
        info!(
            "Processing '{}' for category '{}' with {} keyword phrases",
            source.display(),
            category,
            keywords.len()
        );

        let workspace = TempDir::new().map_err(anyhow::Error::from)?;

        let video_info = self.video.get_video_info(source).await?;
        if !video_info.has_audio {
            warn!("Source {} has no audio track", video_info.filename);
        }

        let audio_info = self
            .audio
            .extract_for_transcription(source, workspace.path())
            .await?;

        let segments = self
            .transcriber
            .transcribe(&audio_info, workspace.path())
            .await?;

        let windows =
            self.plan_windows(&segments, &keywords, video_info.duration.as_secs_f64())?;

        let clip_path = workspace.path().join("highlights_output.mp4");
        self.assembler
            .assemble(source, &windows, workspace.path(), &clip_path)
            .await?;

        let processing_time = started.elapsed();
        info!(
            "Assembled {} highlight windows in {:.2}s",
            windows.len(),
            processing_time.as_secs_f64()
        );

        Ok(AssembledClip {
            clip_path,
            download_name: format!("{}_highlights.mp4", category),
            window_count: windows.len(),
            processing_time,
            _workspace: workspace,
        })
    }

    /// Select triggers and expand them into clip windows; empty output is
    /// the terminal no-highlights condition.
    fn plan_windows(
        &self,
        segments: &[TranscriptSegment],
        keywords: &KeywordSet,
        source_duration: f64,
    ) -> Result<Vec<ClipWindow>, HighlightError> {
        let triggers = select_triggers(segments, keywords);

        let mut windows = build_windows(
            &triggers,
            source_duration,
            self.config.clips.clip_duration_seconds,
        );

        if self.config.clips.merge_overlapping {
            windows = merge_windows(windows);
        }

        if windows.is_empty() {
            return Err(HighlightError::NoHighlightsFound);
        }

        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::FfmpegAssembler;
    use crate::audio::AudioInfo;
    use anyhow::Result;
    use async_trait::async_trait;

    struct FixedTranscriber;

    #[async_trait]
    impl TranscriptionService for FixedTranscriber {
        async fn transcribe(
            &self,
            _audio: &AudioInfo,
            _work_dir: &Path,
        ) -> Result<Vec<TranscriptSegment>> {
            Ok(vec![TranscriptSegment::new(0.0, 3.0, "great save")])
        }
    }

    fn test_pipeline(merge_overlapping: bool) -> HighlightPipeline {
        let mut config = Config::default();
        config.clips.merge_overlapping = merge_overlapping;

        HighlightPipeline::new(
            Arc::new(config),
            Arc::new(SportLexicon::new()),
            Arc::new(FixedTranscriber),
            Arc::new(FfmpegAssembler::default()),
        )
    }

    fn segments() -> Vec<TranscriptSegment> {
        vec![
            TranscriptSegment::new(0.0, 3.0, "great save"),
            TranscriptSegment::new(10.0, 13.0, "nothing here"),
            TranscriptSegment::new(20.0, 23.0, "what a goal"),
        ]
    }

    #[test]
    fn test_plan_windows_from_matches() {
        let pipeline = test_pipeline(false);
        let keywords = KeywordSet::new(vec!["save".to_string(), "goal".to_string()]);

        let windows = pipeline.plan_windows(&segments(), &keywords, 60.0).unwrap();
        assert_eq!(
            windows,
            vec![ClipWindow::new(0.0, 10.0), ClipWindow::new(20.0, 30.0)]
        );
    }

    #[test]
    fn test_plan_windows_empty_keywords_is_no_highlights() {
        let pipeline = test_pipeline(false);

        let result = pipeline.plan_windows(&segments(), &KeywordSet::default(), 60.0);
        assert!(matches!(result, Err(HighlightError::NoHighlightsFound)));
    }

    #[test]
    fn test_plan_windows_no_segments_is_no_highlights() {
        let pipeline = test_pipeline(false);
        let keywords = KeywordSet::new(vec!["goal".to_string()]);

        let result = pipeline.plan_windows(&[], &keywords, 60.0);
        assert!(matches!(result, Err(HighlightError::NoHighlightsFound)));
    }

    #[test]
    fn test_plan_windows_merges_when_configured() {
        let pipeline = test_pipeline(true);
        let keywords = KeywordSet::new(vec!["goal".to_string()]);
        let close_calls = vec![
            TranscriptSegment::new(10.0, 12.0, "goal"),
            TranscriptSegment::new(14.0, 16.0, "another goal"),
        ];

        let windows = pipeline.plan_windows(&close_calls, &keywords, 60.0).unwrap();
        assert_eq!(windows, vec![ClipWindow::new(10.0, 24.0)]);
    }

    #[test]
    fn test_unknown_category_plans_no_highlights() {
        let pipeline = test_pipeline(false);
        let keywords = pipeline.lexicon().resolve("Cricket", None);

        let result = pipeline.plan_windows(&segments(), &keywords, 60.0);
        assert!(matches!(result, Err(HighlightError::NoHighlightsFound)));
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(HighlightError::NoFileProvided.status_code(), 400);
        assert_eq!(HighlightError::NoHighlightsFound.status_code(), 404);
        assert_eq!(
            HighlightError::Processing(anyhow::anyhow!("ffmpeg failed")).status_code(),
            500
        );
    }
}
