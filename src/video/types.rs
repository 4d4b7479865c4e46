use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Prefix shared by every extracted frame file
pub const FRAME_PREFIX: &str = "frame_";

/// Extension of extracted frame files
pub const FRAME_EXTENSION: &str = "jpg";

/// Zero-padding width of the frame index
pub const FRAME_INDEX_WIDTH: usize = 5;

/// Marker placed in the name of a reversed video
pub const REVERSED_MARKER: &str = "_reversed";

/// Where a probed duration was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationSource {
    /// The video stream itself
    #[default]
    Stream,
    /// The container, which may outlast the video stream
    Container,
}

/// Probed metadata of a source or intermediate video
#[derive(Debug, Clone, PartialEq)]
pub struct VideoHandle {
    pub path: PathBuf,
    pub fps: f64,
    pub duration: f64,
    pub duration_source: DurationSource,
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

impl VideoHandle {
    /// Number of frames sampled at the native rate: `floor(duration * fps)`
    pub fn frame_count(&self) -> usize {
        frame_count(self.duration, self.fps)
    }

    /// Timestamp in seconds of the frame at `index`
    pub fn timestamp(&self, index: usize) -> f64 {
        index as f64 / self.fps
    }

    /// File stem used to name frame folders and outputs
    pub fn base_name(&self) -> String {
        base_name(&self.path)
    }

    /// Duration of a single frame in seconds
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps
    }
}

/// `floor(duration * fps)`, tolerant of values like 19.999999 from float math
pub fn frame_count(duration: f64, fps: f64) -> usize {
    if !(duration.is_finite() && fps.is_finite()) || duration <= 0.0 || fps <= 0.0 {
        return 0;
    }
    (duration * fps + 1e-6).floor() as usize
}

/// File stem of a path, or "video" when it has none
pub fn base_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("video")
        .to_string()
}

/// File name of the frame at `index`, e.g. `frame_00042.jpg`
pub fn frame_file_name(index: usize) -> String {
    format!("{FRAME_PREFIX}{index:0width$}.{FRAME_EXTENSION}", width = FRAME_INDEX_WIDTH)
}

/// Index embedded in a frame file name, if it is one
pub fn frame_index<P: AsRef<Path>>(path: P) -> Option<usize> {
    let stem = path.as_ref().file_stem()?.to_str()?;
    let digits = stem.strip_prefix(FRAME_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Traversal order of a frame set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrder {
    Ascending,
    Descending,
}

impl FrameOrder {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Ordered frame images of one video, stored under a per-video folder
///
/// Reversal only changes the traversal order; files are never copied or
/// renamed.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSet {
    base_name: String,
    folder: PathBuf,
    fps: f64,
    frames: Vec<PathBuf>,
    order: FrameOrder,
}

impl FrameSet {
    /// Create a frame set from paths listed in temporal order
    pub fn new<P: Into<PathBuf>>(base_name: String, folder: P, fps: f64, frames: Vec<PathBuf>) -> Self {
        Self {
            base_name,
            folder: folder.into(),
            fps,
            frames,
            order: FrameOrder::Ascending,
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn order(&self) -> FrameOrder {
        self.order
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Playback length at the set's frame rate
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.frames.len() as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Same files sorted by embedded index in the opposite direction
    pub fn reversed(mut self) -> Self {
        self.order = self.order.flipped();
        let order = self.order;
        self.frames.sort_by(|a, b| {
            let key_a = (frame_index(a), a.as_path());
            let key_b = (frame_index(b), b.as_path());
            match order {
                FrameOrder::Ascending => key_a.cmp(&key_b),
                FrameOrder::Descending => key_b.cmp(&key_a),
            }
        });
        self
    }

    pub fn into_frames(self) -> Vec<PathBuf> {
        self.frames
    }
}

/// Order in which the original and reversed clips are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CombineOrder {
    /// Original first, then reversed
    Ab,
    /// Reversed first, then original
    Ba,
}

impl CombineOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ab => "ab",
            Self::Ba => "ba",
        }
    }

    /// Arrange `(original, reversed)` in playback order
    pub fn arrange<T>(self, original: T, reversed: T) -> [T; 2] {
        match self {
            Self::Ab => [original, reversed],
            Self::Ba => [reversed, original],
        }
    }
}

impl fmt::Display for CombineOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind marker carried by an output name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMarker {
    /// Custom name without a recognised marker
    None,
    Reversed,
    Combined(CombineOrder),
}

impl NameMarker {
    fn render(self) -> String {
        match self {
            Self::None => String::new(),
            Self::Reversed => REVERSED_MARKER.to_string(),
            Self::Combined(order) => format!("_combo_{}", order),
        }
    }
}

/// Output file name built from parts rather than string substitution
///
/// Rendered as `{head}{marker}{tail}.{extension}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputName {
    head: String,
    tail: String,
    extension: String,
    marker: NameMarker,
}

impl OutputName {
    /// `<base_name>_reversed.<extension>`
    pub fn reversed(base_name: &str, extension: &str) -> Self {
        Self {
            head: base_name.to_string(),
            tail: String::new(),
            extension: extension.to_string(),
            marker: NameMarker::Reversed,
        }
    }

    /// Parse a caller-supplied name, locating the `_reversed` marker if present
    ///
    /// A name without an extension gets `default_extension`.
    pub fn custom(name: &str, default_extension: &str) -> Self {
        let path = Path::new(name);
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(default_extension)
            .to_string();

        match stem.rfind(REVERSED_MARKER) {
            Some(at) => Self {
                head: stem[..at].to_string(),
                tail: stem[at + REVERSED_MARKER.len()..].to_string(),
                extension,
                marker: NameMarker::Reversed,
            },
            None => Self {
                head: stem,
                tail: String::new(),
                extension,
                marker: NameMarker::None,
            },
        }
    }

    /// Name of the combined video derived from this one
    pub fn combined(&self, order: CombineOrder) -> Self {
        Self {
            marker: NameMarker::Combined(order),
            ..self.clone()
        }
    }

    pub fn marker(&self) -> NameMarker {
        self.marker
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn stem(&self) -> String {
        format!("{}{}{}", self.head, self.marker.render(), self.tail)
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem(), self.extension)
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Represents an encoded video output
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub fps: f64,
    pub duration: f64,
    pub frame_count: usize,
    pub file_size: u64,
}
