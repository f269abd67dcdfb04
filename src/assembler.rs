use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};

use crate::highlights::ClipWindow;

/// Concatenating clip encoder injected into the pipeline at construction.
#[async_trait]
pub trait ClipAssembler: Send + Sync {
    /// Cut the given windows from `source` and concatenate them into
    /// `output_path`, using `work_dir` for intermediate files.
    async fn assemble(
        &self,
        source: &Path,
        windows: &[ClipWindow],
        work_dir: &Path,
        output_path: &Path,
    ) -> Result<()>;
}

/// ffmpeg-based assembler: one re-encoded cut per window, then a
/// concat-demuxer join.
#[derive(Debug, Clone)]
pub struct FfmpegAssembler {
    /// x264 preset for the per-window encodes
    preset: String,
    /// Encoder thread count
    threads: usize,
}

impl FfmpegAssembler {
    pub fn new(preset: impl Into<String>, threads: usize) -> Self {
        let threads = if threads == 0 {
            num_cpus::get().min(8)
        } else {
            threads
        };
        Self {
            preset: preset.into(),
            threads,
        }
    }

    async fn cut_window(
        &self,
        source: &Path,
        window: &ClipWindow,
        part_path: &Path,
    ) -> Result<()> {
        let status = tokio::process::Command::new("ffmpeg")
            .args([
                "-ss",
                &format!("{:.3}", window.start),
                "-i",
                source
                    .to_str()
                    .ok_or_else(|| anyhow!("Non-UTF8 source path"))?,
                "-t",
                &format!("{:.3}", window.duration()),
                "-c:v",
                "libx264",
                "-preset",
                &self.preset,
                "-threads",
                &self.threads.to_string(),
                "-c:a",
                "aac",
                "-y",
                part_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Non-UTF8 part path"))?,
            ])
            .status()
            .await?;

        if !status.success() {
            return Err(anyhow!(
                "Clip cut failed for window {:.3}-{:.3}",
                window.start,
                window.end
            ));
        }

        Ok(())
    }

    async fn concat_parts(&self, list_path: &Path, output_path: &Path) -> Result<()> {
        let status = tokio::process::Command::new("ffmpeg")
            .args([
                "-f",
                "concat",
                "-safe",
                "0",
                "-i",
                list_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Non-UTF8 list path"))?,
                "-c",
                "copy",
                "-movflags",
                "+faststart",
                "-y",
                output_path
                    .to_str()
                    .ok_or_else(|| anyhow!("Non-UTF8 output path"))?,
            ])
            .status()
            .await?;

        if !status.success() {
            return Err(anyhow!("Clip concatenation failed"));
        }

        Ok(())
    }
}

impl Default for FfmpegAssembler {
    fn default() -> Self {
        Self::new("ultrafast", 0)
    }
}

#[async_trait]
impl ClipAssembler for FfmpegAssembler {
    async fn assemble(
        &self,
        source: &Path,
        windows: &[ClipWindow],
        work_dir: &Path,
        output_path: &Path,
    ) -> Result<()> {
        // Zero-length windows come from triggers at the very end of the
        // source; tolerate them here by skipping the cut.
        let mut part_paths = Vec::with_capacity(windows.len());

        for (index, window) in windows.iter().enumerate() {
            if window.is_empty() {
                warn!(
                    "Skipping zero-length window at {:.3}s (trigger past source end)",
                    window.start
                );
                continue;
            }

            let part_path = work_dir.join(format!("part_{:03}.mp4", index));
            self.cut_window(source, window, &part_path).await?;
            part_paths.push(part_path);
        }

        if part_paths.is_empty() {
            return Err(anyhow!("All clip windows were zero-length, nothing to assemble"));
        }

        let list_path = work_dir.join("concat_list.txt");
        let list_content: String = part_paths
            .iter()
            .map(|p| format!("file '{}'\n", p.display()))
            .collect();
        tokio::fs::write(&list_path, list_content).await?;

        self.concat_parts(&list_path, output_path).await?;

        info!(
            "Assembled {} clips into {}",
            part_paths.len(),
            output_path.display()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembler_thread_autodetect() {
        let assembler = FfmpegAssembler::new("ultrafast", 0);
        assert!(assembler.threads > 0);

        let fixed = FfmpegAssembler::new("fast", 2);
        assert_eq!(fixed.threads, 2);
    }

    #[tokio::test]
    async fn test_assemble_rejects_all_empty_windows() {
        let assembler = FfmpegAssembler::default();
        let dir = tempfile::tempdir().unwrap();
        let windows = vec![ClipWindow::new(90.0, 90.0)];

        let result = assembler
            .assemble(
                Path::new("missing.mp4"),
                &windows,
                dir.path(),
                &dir.path().join("out.mp4"),
            )
            .await;

        assert!(result.is_err());
    }
}
