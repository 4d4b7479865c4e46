use std::path::Path;

use tracing::info;

use crate::config::{EncoderConfig, OnExisting};
use crate::error::{Result, ReverserError};
use crate::video::ffmpeg::{stderr_summary, MediaTools};
use crate::video::output::{describe_output, resolve_output_path};
use crate::video::probe::VideoProber;
use crate::video::types::{CombineOrder, EncodedVideo, OutputName, VideoHandle};

/// Concatenates an original clip and its reversed version back to back
pub struct Combiner {
    tools: MediaTools,
    prober: VideoProber,
    encoder: EncoderConfig,
    on_existing: OnExisting,
}

impl Combiner {
    pub fn new(tools: MediaTools, encoder: EncoderConfig, on_existing: OnExisting) -> Self {
        Self {
            prober: VideoProber::new(tools.clone()),
            tools,
            encoder,
            on_existing,
        }
    }

    /// Join `original` and `reversed` in `order` next to `reversed`
    ///
    /// `reversed_name` is the name the reversed video was written under; the
    /// combined file takes the same name with the combo marker.
    pub async fn combine(
        &self,
        original: &Path,
        reversed: &Path,
        reversed_name: &OutputName,
        order: CombineOrder,
    ) -> Result<EncodedVideo> {
        let original = self.prober.open(original).await?;
        let reversed_handle = self.prober.open(reversed).await?;
        let [first, second] = order.arrange(&original, &reversed_handle);

        let (width, height) = target_size(first)?;
        let fps = first.fps.max(second.fps);

        let output_dir = reversed.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(output_dir)?;
        let output_path = resolve_output_path(output_dir, &reversed_name.combined(order), self.on_existing);

        info!(
            "🔁 Combining ({}) {} + {} into {}",
            order,
            first.path.display(),
            second.path.display(),
            output_path.display()
        );

        let mut cmd = self.tools.ffmpeg_command();
        cmd.arg("-i")
            .arg(&first.path)
            .arg("-i")
            .arg(&second.path)
            .arg("-filter_complex")
            .arg(concat_filter(width, height, fps))
            .args(["-map", "[out]"])
            .arg("-r")
            .arg(fps.to_string())
            .args(self.encoder.output_args())
            .arg(&output_path);

        let output = self.tools.run_ffmpeg(cmd).await?;
        if !output.status.success() {
            return Err(ReverserError::encode(format!("FFmpeg failed: {}", stderr_summary(&output))));
        }

        let handle = self.prober.open(&output_path).await.map_err(|e| {
            ReverserError::encode(format!(
                "combined video {} cannot be reopened: {}",
                output_path.display(),
                e
            ))
        })?;
        let combined = describe_output(&output_path, fps, handle.frame_count())?;

        info!("✅ Wrote {} ({:.2}s)", combined.path.display(), combined.duration);
        Ok(combined)
    }
}

/// Even frame size of the clip that plays first
fn target_size(handle: &VideoHandle) -> Result<(u32, u32)> {
    let (width, height) = (handle.width & !1, handle.height & !1);
    if width == 0 || height == 0 {
        return Err(ReverserError::encode(format!(
            "unknown frame size for {}",
            handle.path.display()
        )));
    }
    Ok((width, height))
}

/// Normalise both inputs to one size, pixel aspect and rate, then join them
fn concat_filter(width: u32, height: u32, fps: f64) -> String {
    let normalise = |input: usize| {
        format!("[{input}:v]scale={width}:{height},setsar=1,fps={fps},format=yuv420p[v{input}]")
    };
    format!("{};{};[v0][v1]concat=n=2:v=1:a=0[out]", normalise(0), normalise(1))
}
