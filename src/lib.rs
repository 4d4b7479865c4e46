//! # Video-Reverser
//!
//! Reverse videos frame by frame, optionally looping them with the original clip.
//!
//! Each input is probed, every frame is written as a JPEG at the native frame
//! rate, the frames are encoded back in descending order, and the original and
//! reversed clips can be joined in either order. All decoding and encoding is
//! delegated to the `ffmpeg` and `ffprobe` executables.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use video_reverser::{
//!     batch::{BatchDriver, BatchOptions},
//!     config::Config,
//!     video::CombineOrder,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let driver = BatchDriver::new(Config::default())?;
//! let options = BatchOptions {
//!     keep_frames: false,
//!     combine: Some(CombineOrder::Ab),
//!     output_name: None,
//! };
//!
//! let report = driver.process_batch(&[PathBuf::from("clip.mp4")], &options).await?;
//! println!("{}", report.status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`video`] - Probing, frame extraction, reassembly and combination
//! - [`batch`] - Per-video pipeline and batch aggregation
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! ## Output Layout
//!
//! ```text
//! <output_root>/extracted_frames/<name>/frame_00000.jpg
//! <output_root>/reversed_videos/<name>_reversed.mp4
//! <output_root>/reversed_videos/<name>_combo_ab.mp4
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    batch::{BatchDriver, BatchOptions, BatchReport},
    config::Config,
    error::{ReverserError, Result},
    video::CombineOrder,
};
