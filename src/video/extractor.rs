use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::error::{Result, ReverserError};
use crate::video::ffmpeg::{stderr_summary, MediaTools};
use crate::video::types::{
    frame_file_name, DurationSource, FrameSet, VideoHandle, FRAME_EXTENSION, FRAME_INDEX_WIDTH, FRAME_PREFIX,
};

/// Samples every frame of a video at its native rate into a per-video folder
pub struct FrameExtractor {
    tools: MediaTools,
    frames_root: PathBuf,
    jpeg_quality: u8,
}

impl FrameExtractor {
    pub fn new<P: Into<PathBuf>>(tools: MediaTools, frames_root: P, config: &ExtractionConfig) -> Self {
        Self {
            tools,
            frames_root: frames_root.into(),
            jpeg_quality: config.jpeg_quality,
        }
    }

    /// `<frames_root>/<base_name>`
    pub fn frames_folder(&self, base_name: &str) -> PathBuf {
        self.frames_root.join(base_name)
    }

    /// Paths the extraction of `handle` writes, in temporal order
    pub fn planned_frames(&self, handle: &VideoHandle) -> Vec<PathBuf> {
        let folder = self.frames_folder(&handle.base_name());
        (0..handle.frame_count())
            .map(|i| folder.join(frame_file_name(i)))
            .collect()
    }

    /// Write `frame_<i>.jpg` for every `i` in `0..floor(duration * fps)`
    ///
    /// Existing files in the folder are left alone apart from the ones this
    /// run overwrites. Any frame that fails to appear fails the whole set.
    pub async fn extract(&self, handle: &VideoHandle) -> Result<FrameSet> {
        let base_name = handle.base_name();
        let folder = self.frames_folder(&base_name);
        std::fs::create_dir_all(&folder)?;

        let frames = self.planned_frames(handle);
        let count = frames.len();

        info!("🎞️  Extracting {} frames from {} into {}", count, handle.path.display(), folder.display());

        if count == 0 {
            warn!("{} has no whole frame at {:.3} fps", handle.path.display(), handle.fps);
            return Ok(FrameSet::new(base_name, folder, handle.fps, frames));
        }

        // Stale frames from an earlier run must not count as sampled
        for frame in &frames {
            if let Err(e) = std::fs::remove_file(frame) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(e.into());
                }
            }
        }

        let mut cmd = self.tools.ffmpeg_command();
        cmd.arg("-i")
            .arg(&handle.path)
            .args(["-map", "0:v:0"])
            .arg("-vf")
            .arg(frame_filter(handle))
            .arg("-frames:v")
            .arg(count.to_string())
            .args(["-start_number", "0"])
            .arg("-q:v")
            .arg(self.jpeg_quality.to_string())
            .args(["-f", "image2"])
            .arg(frame_pattern(&folder));

        let output = self.tools.run_ffmpeg(cmd).await?;
        let missing = first_missing(&frames);

        if !output.status.success() {
            return Err(ReverserError::frame_sample(missing.unwrap_or(0), stderr_summary(&output)));
        }

        if let Some(index) = missing {
            return Err(ReverserError::frame_sample(
                index,
                format!("decoder produced {} of {} frames", index, count),
            ));
        }

        debug!("Extracted {} frames to {}", count, folder.display());
        Ok(FrameSet::new(base_name, folder, handle.fps, frames))
    }
}

/// Resample to the native rate
///
/// A container duration can outlast the video stream, so the tail is then
/// padded with the last decoded frame; `-frames:v` still caps the count.
fn frame_filter(handle: &VideoHandle) -> String {
    match handle.duration_source {
        DurationSource::Stream => format!("fps={}", handle.fps),
        DurationSource::Container => format!(
            "fps={},tpad=stop_mode=clone:stop_duration={}",
            handle.fps, handle.duration
        ),
    }
}

/// `<folder>/frame_%05d.jpg`
fn frame_pattern(folder: &Path) -> PathBuf {
    folder.join(format!("{FRAME_PREFIX}%0{FRAME_INDEX_WIDTH}d.{FRAME_EXTENSION}"))
}

fn first_missing(frames: &[PathBuf]) -> Option<usize> {
    frames.iter().position(|frame| {
        std::fs::metadata(frame)
            .map(|m| m.len() == 0)
            .unwrap_or(true)
    })
}
