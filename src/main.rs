use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use video_reverser::{
    batch::{BatchDriver, BatchObserver, BatchOptions},
    config::Config,
    video::{CombineOrder, EncodedVideo, MediaTools},
    ReverserError,
};

#[derive(Parser)]
#[command(
    name = "video-reverser",
    version,
    about = "Reverse videos frame by frame",
    long_about = "Video-Reverser extracts every frame of a video, encodes the frames back in reverse order, and can join the original and reversed clips into a loop."
)]
struct Cli {
    /// Path(s) to the video(s) to reverse
    #[arg(long, num_args = 1..)]
    video: Vec<PathBuf>,

    /// Keep extracted frames
    #[arg(long)]
    keep_frames: bool,

    /// Concatenate original and reversed video in ab or ba order
    #[arg(long, value_enum)]
    video_loop: Option<CombineOrder>,

    /// File name for the reversed video (single video only)
    #[arg(long)]
    output_name: Option<String>,

    /// Directory for extracted frames and reversed videos (default: next to the executable)
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Prints per-video progress lines
struct ConsoleObserver;

impl BatchObserver for ConsoleObserver {
    fn on_start(&mut self, source: &Path) {
        println!("[INFO] Processing: {}", source.display());
    }

    fn on_reversed(&mut self, _source: &Path, output: &EncodedVideo) {
        println!("[SUCCESS] Reversed video saved at: {}", output.path.display());
    }

    fn on_combined(&mut self, _source: &Path, output: &EncodedVideo) {
        println!("[INFO] Combined video saved at: {}", output.path.display());
    }

    fn on_failed(&mut self, source: &Path, error: &ReverserError) {
        eprintln!("[ERROR] {}: {}", source.display(), error.user_message());
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    info!("Starting Video-Reverser v{}", env!("CARGO_PKG_VERSION"));

    if cli.video.is_empty() {
        bail!("no input given: pass one or more --video paths");
    }

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            debug!("Using default configuration");
            Config::default()
        }
    };

    if let Some(root) = cli.output_root {
        config.paths.output_root = root;
    }

    if !MediaTools::new(&config.tools).check_available() {
        bail!("'{}' could not be run; install FFmpeg or set tools.ffmpeg in the config", config.tools.ffmpeg.display());
    }

    let driver = BatchDriver::new(config)?;
    let options = BatchOptions {
        keep_frames: cli.keep_frames,
        combine: cli.video_loop,
        output_name: cli.output_name,
    };

    let report = driver
        .process_batch_with(&cli.video, &options, &mut ConsoleObserver)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    if cli.keep_frames && !report.frames.is_empty() {
        println!("[INFO] Kept {} frames", report.frames.len());
    }

    println!("{}", report.status);

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
