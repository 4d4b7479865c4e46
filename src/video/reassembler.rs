use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{EncoderConfig, OnExisting};
use crate::error::{Result, ReverserError, VideoError};
use crate::video::ffmpeg::{stderr_summary, MediaTools};
use crate::video::output::{describe_output, resolve_output_path};
use crate::video::types::{EncodedVideo, FrameOrder, FrameSet, OutputName};

/// Crop to even dimensions, which yuv420p encoders require
pub(crate) const EVEN_DIMENSIONS: &str = "scale=trunc(iw/2)*2:trunc(ih/2)*2,setsar=1";

/// Builds videos from frame image sequences
pub struct Reassembler {
    tools: MediaTools,
    videos_root: PathBuf,
    encoder: EncoderConfig,
    on_existing: OnExisting,
}

impl Reassembler {
    pub fn new<P: Into<PathBuf>>(
        tools: MediaTools,
        videos_root: P,
        encoder: EncoderConfig,
        on_existing: OnExisting,
    ) -> Self {
        Self {
            tools,
            videos_root: videos_root.into(),
            encoder,
            on_existing,
        }
    }

    pub fn videos_root(&self) -> &Path {
        &self.videos_root
    }

    /// Encode `frames` so that playback runs from the highest index to the lowest
    pub async fn reverse(&self, frames: FrameSet, name: &OutputName) -> Result<EncodedVideo> {
        let frames = match frames.order() {
            FrameOrder::Ascending => frames.reversed(),
            FrameOrder::Descending => frames,
        };
        self.reassemble(&frames, name).await
    }

    /// Encode `frames` in their current traversal order at the set's frame rate
    pub async fn reassemble(&self, frames: &FrameSet, name: &OutputName) -> Result<EncodedVideo> {
        if frames.is_empty() {
            return Err(ReverserError::encode(format!(
                "no frames to encode for '{}'",
                frames.base_name()
            )));
        }

        if !(frames.fps().is_finite() && frames.fps() > 0.0) {
            return Err(ReverserError::encode(format!("invalid frame rate {}", frames.fps())));
        }

        let (width, height) = check_frames(frames.frames())?;

        std::fs::create_dir_all(&self.videos_root)?;
        let output_path = resolve_output_path(&self.videos_root, name, self.on_existing);

        info!(
            "🎬 Encoding {} frames ({}x{} @ {:.3} fps) to {}",
            frames.len(),
            width,
            height,
            frames.fps(),
            output_path.display()
        );

        let fps = frames.fps().to_string();
        let mut cmd = self.tools.ffmpeg_command();
        cmd.args(["-f", "image2pipe", "-c:v", "mjpeg", "-framerate"])
            .arg(&fps)
            .args(["-i", "-"])
            .args(["-vf", EVEN_DIMENSIONS])
            .arg("-r")
            .arg(&fps)
            .args(self.encoder.output_args())
            .arg(&output_path);

        let output = self
            .tools
            .run_ffmpeg_with_input(cmd, frames.frames().to_vec())
            .await
            .map_err(|e| match e {
                ReverserError::Io(io) => ReverserError::encode(format!("failed to feed frames: {}", io)),
                other => other,
            })?;

        if !output.status.success() {
            return Err(VideoError::Encode {
                reason: format!("FFmpeg failed: {}", stderr_summary(&output)),
            }
            .into());
        }

        let encoded = describe_output(&output_path, frames.fps(), frames.len())?;
        info!("✅ Wrote {} ({} KB)", encoded.path.display(), encoded.file_size / 1024);
        Ok(encoded)
    }
}

/// All frames must be readable images of one size; returns that size
fn check_frames(frames: &[PathBuf]) -> Result<(u32, u32)> {
    let sizes: Vec<std::result::Result<(u32, u32), String>> = frames
        .par_iter()
        .map(|frame| {
            image::image_dimensions(frame).map_err(|e| format!("unreadable frame {}: {}", frame.display(), e))
        })
        .collect();

    let mut expected = None;
    for (frame, size) in frames.iter().zip(sizes) {
        let size = size.map_err(ReverserError::encode)?;
        match expected {
            None => expected = Some(size),
            Some(first) if first != size => {
                return Err(ReverserError::encode(format!(
                    "frame {} is {}x{}, expected {}x{}",
                    frame.display(),
                    size.0,
                    size.1,
                    first.0,
                    first.1
                )));
            }
            Some(_) => {}
        }
    }

    debug!("Checked {} frames", frames.len());
    expected.ok_or_else(|| ReverserError::encode("no frames to encode"))
}
