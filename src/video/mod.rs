//! # Video Processing Module
//!
//! Probing, frame extraction, reassembly and concatenation, all driven
//! through the external `ffmpeg`/`ffprobe` tools.

pub mod types;
pub mod ffmpeg;
pub mod probe;
pub mod extractor;
pub mod reassembler;
pub mod combiner;
pub mod output;

#[cfg(all(test, unix))]
pub(crate) mod fake_tools;

pub use types::{CombineOrder, DurationSource, EncodedVideo, FrameOrder, FrameSet, OutputName, VideoHandle};
pub use ffmpeg::MediaTools;
pub use probe::VideoProber;
pub use extractor::FrameExtractor;
pub use reassembler::Reassembler;
pub use combiner::Combiner;
