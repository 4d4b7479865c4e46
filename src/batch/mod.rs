//! # Batch Driver
//!
//! Runs extraction, reversal and optional combination over a list of videos
//! and aggregates per-video outcomes into a single report.

pub mod driver;

pub use driver::{BatchDriver, BatchObserver, BatchOptions, BatchReport, ReversedVideo, SilentObserver, VideoOutcome};
