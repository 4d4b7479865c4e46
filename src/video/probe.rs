use std::ffi::OsString;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, ReverserError};
use crate::video::ffmpeg::{stderr_summary, MediaTools};
use crate::video::types::{DurationSource, VideoHandle};

#[derive(Debug, Deserialize)]
struct ProbeReport {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Opens videos by probing them with `ffprobe`
pub struct VideoProber {
    tools: MediaTools,
}

impl VideoProber {
    pub fn new(tools: MediaTools) -> Self {
        Self { tools }
    }

    /// Probe `path` and return a handle describing its first video stream
    pub async fn open<P: AsRef<Path>>(&self, path: P) -> Result<VideoHandle> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        if !path.is_file() {
            return Err(ReverserError::media_open(path_str, "file does not exist"));
        }

        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name,width,height,r_frame_rate,avg_frame_rate,duration:format=duration",
            "-of",
            "json",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(path.as_os_str().to_owned());

        let output = self.tools.ffprobe(args).await?;

        if !output.status.success() {
            return Err(ReverserError::media_open(path_str, stderr_summary(&output)));
        }

        let json = String::from_utf8_lossy(&output.stdout);
        let handle = parse_probe_output(path, &json)?;

        info!(
            "Opened {}: {}x{} @ {:.3} fps, {:.3}s ({})",
            path.display(),
            handle.width,
            handle.height,
            handle.fps,
            handle.duration,
            handle.codec
        );
        Ok(handle)
    }
}

/// Build a handle from `ffprobe -of json` output
pub(crate) fn parse_probe_output(path: &Path, json: &str) -> Result<VideoHandle> {
    let path_str = path.display().to_string();
    let report: ProbeReport = serde_json::from_str(json)
        .map_err(|e| ReverserError::media_open(&path_str, format!("invalid ffprobe output: {}", e)))?;

    let stream = report
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| ReverserError::media_open(&path_str, "no video stream"))?;

    let fps = [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .flatten()
        .find_map(|rate| parse_rate(rate))
        .ok_or_else(|| ReverserError::media_open(&path_str, "unknown frame rate"))?;

    // Stream duration first: a longer audio track stretches the container's
    let container = report.format.as_ref().and_then(|f| f.duration.as_deref());
    let (duration, duration_source) = parse_duration(stream.duration.as_deref())
        .map(|d| (d, DurationSource::Stream))
        .or_else(|| parse_duration(container).map(|d| (d, DurationSource::Container)))
        .ok_or_else(|| ReverserError::media_open(&path_str, "unknown duration"))?;

    debug!(
        "Probe of {}: fps={} duration={} ({:?})",
        path_str, fps, duration, duration_source
    );

    Ok(VideoHandle {
        path: path.to_path_buf(),
        fps,
        duration,
        duration_source,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
        codec: stream.codec_name.unwrap_or_else(|| "unknown".to_string()),
    })
}

fn parse_duration(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}

/// Parse an ffprobe rate such as `30000/1001` or `25`; zero and invalid rates give `None`
pub fn parse_rate(rate: &str) -> Option<f64> {
    let rate = rate.trim();
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.parse().ok()?,
    };

    (value.is_finite() && value > 0.0).then_some(value)
}
