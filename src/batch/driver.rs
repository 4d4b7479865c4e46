use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    config::Config,
    error::{BatchError, Result, ReverserError},
    video::{
        types::base_name, CombineOrder, Combiner, EncodedVideo, FrameExtractor, MediaTools,
        OutputName, Reassembler, VideoHandle, VideoProber,
    },
};

/// Status reported when the batch has no inputs
pub const NOTHING_TO_PROCESS: &str = "No video selected.";

/// Status reported when every video succeeded
pub const ALL_REVERSED: &str = "✅ All videos reversed!";

/// Per-batch switches chosen by the caller
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Keep extracted frames and report their paths
    pub keep_frames: bool,

    /// Also join original and reversed clips in this order
    pub combine: Option<CombineOrder>,

    /// Explicit file name for the reversed video (single-video batches only)
    pub output_name: Option<String>,
}

/// Result of reversing one video
#[derive(Debug, Clone)]
pub struct ReversedVideo {
    pub source: PathBuf,
    pub name: OutputName,
    pub output: EncodedVideo,
    pub combined: Option<EncodedVideo>,
    /// Frame paths, only filled when keep-frames was requested
    pub frames: Vec<PathBuf>,
}

/// What happened to one input of a batch
#[derive(Debug, Clone)]
pub enum VideoOutcome {
    Reversed(ReversedVideo),
    Failed { source: PathBuf, error: String },
}

impl VideoOutcome {
    pub fn source(&self) -> &Path {
        match self {
            Self::Reversed(video) => &video.source,
            Self::Failed { source, .. } => source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Reversed(_))
    }
}

/// Aggregate result of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Human-readable overall status
    pub status: String,

    /// First input, for previewing the original
    pub original: Option<PathBuf>,

    /// Last successfully written reversed video
    pub reversed: Option<PathBuf>,

    /// Every combined video written
    pub combined: Vec<PathBuf>,

    /// Union of kept frame paths across the batch
    pub frames: Vec<PathBuf>,

    pub outcomes: Vec<VideoOutcome>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Receives progress notifications while a batch runs
pub trait BatchObserver {
    fn on_start(&mut self, _source: &Path) {}

    fn on_reversed(&mut self, _source: &Path, _output: &EncodedVideo) {}

    fn on_combined(&mut self, _source: &Path, _output: &EncodedVideo) {}

    fn on_failed(&mut self, _source: &Path, _error: &ReverserError) {}
}

/// Observer that ignores every notification
pub struct SilentObserver;

impl BatchObserver for SilentObserver {}

/// Runs extraction, reversal and optional combination for each input video
///
/// The pipeline per video:
/// 1. Probe - open the source and read its frame rate and duration
/// 2. Extract - write every frame as a JPEG under the frames root
/// 3. Reverse - encode the frames backwards into the videos root
/// 4. Combine - optionally join original and reversed clips
/// 5. Tidy - drop frames the caller did not ask to keep
pub struct BatchDriver {
    config: Config,
    prober: VideoProber,
    extractor: FrameExtractor,
    reassembler: Reassembler,
    combiner: Combiner,
}

impl BatchDriver {
    /// Create a driver; the configuration is validated first
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let tools = MediaTools::new(&config.tools);
        Ok(Self {
            prober: VideoProber::new(tools.clone()),
            extractor: FrameExtractor::new(tools.clone(), config.frames_root(), &config.extraction),
            reassembler: Reassembler::new(
                tools.clone(),
                config.videos_root(),
                config.encoder.clone(),
                config.output.on_existing,
            ),
            combiner: Combiner::new(tools, config.encoder.clone(), config.output.on_existing),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract the frames of `video` and write them back in reverse
    ///
    /// Frame paths are returned only when `keep_frames` is set. Unrequested
    /// frames are removed whether or not the reversal succeeds.
    pub async fn extract_and_reverse(
        &self,
        video: &Path,
        keep_frames: bool,
        output_name: Option<&str>,
    ) -> Result<ReversedVideo> {
        info!("📹 Step 1: Opening {}", video.display());
        let handle = self.prober.open(video).await?;

        let name = match output_name {
            Some(name) => OutputName::custom(name, &self.config.encoder.extension),
            None => OutputName::reversed(&base_name(video), &self.config.encoder.extension),
        };

        let folder = self.extractor.frames_folder(&handle.base_name());
        let frame_paths = self.extractor.planned_frames(&handle);
        let tidy = !keep_frames && !self.config.output.retain_unrequested_frames;

        let reversed = self.reverse_frames(&handle, &name).await;
        if tidy {
            remove_frames(&folder, &frame_paths);
        }

        Ok(ReversedVideo {
            source: video.to_path_buf(),
            name,
            output: reversed?,
            combined: None,
            frames: if keep_frames { frame_paths } else { Vec::new() },
        })
    }

    async fn reverse_frames(&self, handle: &VideoHandle, name: &OutputName) -> Result<EncodedVideo> {
        info!("🎞️  Step 2: Extracting frames...");
        let frames = self.extractor.extract(handle).await?;

        info!("⏪ Step 3: Reversing {} frames...", frames.len());
        self.reassembler.reverse(frames, name).await
    }

    /// Join the original clip and its reversed version in `order`
    pub async fn combine_clips(&self, reversed: &ReversedVideo, order: CombineOrder) -> Result<EncodedVideo> {
        info!("🔁 Step 4: Combining clips ({})...", order);
        self.combiner
            .combine(&reversed.source, &reversed.output.path, &reversed.name, order)
            .await
    }

    /// Reverse one video and, if requested, combine it with the original
    pub async fn process_video(&self, video: &Path, options: &BatchOptions) -> Result<ReversedVideo> {
        let mut reversed = self
            .extract_and_reverse(video, options.keep_frames, options.output_name.as_deref())
            .await?;

        if let Some(order) = options.combine {
            reversed.combined = Some(self.combine_clips(&reversed, order).await?);
        }

        Ok(reversed)
    }

    /// Process every path in order without progress notifications
    pub async fn process_batch(&self, videos: &[PathBuf], options: &BatchOptions) -> Result<BatchReport> {
        self.process_batch_with(videos, options, &mut SilentObserver).await
    }

    /// Process every path in order, one at a time
    ///
    /// With `batch.stop_on_error` the first failure aborts the batch;
    /// otherwise failures are recorded and the next video is attempted.
    pub async fn process_batch_with(
        &self,
        videos: &[PathBuf],
        options: &BatchOptions,
        observer: &mut dyn BatchObserver,
    ) -> Result<BatchReport> {
        if videos.is_empty() {
            info!("{}", NOTHING_TO_PROCESS);
            return Ok(BatchReport {
                status: NOTHING_TO_PROCESS.to_string(),
                ..BatchReport::default()
            });
        }

        let mut options = options.clone();
        if options.output_name.is_some() && videos.len() > 1 {
            warn!("Ignoring explicit output name for a batch of {} videos", videos.len());
            options.output_name = None;
        }

        let mut report = BatchReport {
            original: videos.first().cloned(),
            ..BatchReport::default()
        };

        for (i, video) in videos.iter().enumerate() {
            info!("▶️  [{}/{}] Processing {}", i + 1, videos.len(), video.display());
            observer.on_start(video);

            match self.process_video(video, &options).await {
                Ok(reversed) => {
                    observer.on_reversed(video, &reversed.output);
                    report.reversed = Some(reversed.output.path.clone());

                    if let Some(combined) = &reversed.combined {
                        observer.on_combined(video, combined);
                        report.combined.push(combined.path.clone());
                    }

                    report.frames.extend(reversed.frames.iter().cloned());
                    report.outcomes.push(VideoOutcome::Reversed(reversed));
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", video.display(), e);
                    observer.on_failed(video, &e);

                    if self.config.batch.stop_on_error {
                        return Err(BatchError::Aborted {
                            path: video.display().to_string(),
                            source: Box::new(e),
                        }
                        .into());
                    }

                    report.outcomes.push(VideoOutcome::Failed {
                        source: video.clone(),
                        error: e.user_message(),
                    });
                }
            }
        }

        report.status = batch_status(report.failed_count(), videos.len());
        info!("{}", report.status);
        Ok(report)
    }
}

fn batch_status(failed: usize, total: usize) -> String {
    match failed {
        0 => ALL_REVERSED.to_string(),
        n if n == total => format!("❌ All {} videos failed", total),
        n => format!("⚠️ {} of {} videos failed", n, total),
    }
}

/// Delete this run's frames, then the folder if nothing else is in it
fn remove_frames(folder: &Path, frames: &[PathBuf]) {
    for frame in frames {
        match std::fs::remove_file(frame) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", frame.display(), e),
        }
    }

    match std::fs::remove_dir(folder) {
        Ok(()) => debug!("Removed {}", folder.display()),
        Err(e) => debug!("Left {} in place: {}", folder.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(unix)]
    use crate::video::fake_tools;
    use crate::video::types::frame_file_name;
    use tempfile::tempdir;

    fn test_config(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.output_root = root.to_path_buf();
        config
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<PathBuf>,
        failed: Vec<PathBuf>,
    }

    impl BatchObserver for Recorder {
        fn on_start(&mut self, source: &Path) {
            self.started.push(source.to_path_buf());
        }

        fn on_failed(&mut self, source: &Path, _error: &ReverserError) {
            self.failed.push(source.to_path_buf());
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let dir = tempdir().unwrap();
        let driver = BatchDriver::new(test_config(dir.path())).unwrap();

        let report = driver.process_batch(&[], &BatchOptions::default()).await.unwrap();
        assert_eq!(report.status, NOTHING_TO_PROCESS);
        assert!(report.outcomes.is_empty());
        assert!(report.original.is_none());
        assert!(!dir.path().join("reversed_videos").exists());
    }

    #[tokio::test]
    async fn test_failures_are_isolated_by_default() {
        let dir = tempdir().unwrap();
        let driver = BatchDriver::new(test_config(dir.path())).unwrap();
        let videos = vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")];
        let mut recorder = Recorder::default();

        let report = driver
            .process_batch_with(&videos, &BatchOptions::default(), &mut recorder)
            .await
            .unwrap();

        assert_eq!(recorder.started, videos);
        assert_eq!(recorder.failed, videos);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.status, "❌ All 2 videos failed");
        assert_eq!(report.original.as_deref(), Some(videos[0].as_path()));
        assert!(report.reversed.is_none());
        assert!(!dir.path().join("reversed_videos").join("a_reversed.mp4").exists());
    }

    #[tokio::test]
    async fn test_stop_on_error_aborts() {
        let dir = tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.batch.stop_on_error = true;
        let driver = BatchDriver::new(config).unwrap();
        let videos = vec![dir.path().join("a.mp4"), dir.path().join("b.mp4")];
        let mut recorder = Recorder::default();

        let err = driver
            .process_batch_with(&videos, &BatchOptions::default(), &mut recorder)
            .await
            .unwrap_err();

        assert!(matches!(err, ReverserError::Batch(BatchError::Aborted { .. })));
        assert_eq!(recorder.started.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_source_is_media_open_error() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("notes.mp4");
        std::fs::write(&bogus, b"definitely not a video").unwrap();
        let driver = BatchDriver::new(test_config(dir.path())).unwrap();

        let err = driver.extract_and_reverse(&bogus, false, None).await.unwrap_err();
        // ffprobe rejects the file, or is missing entirely on this machine
        assert!(
            err.is_media_open()
                || matches!(err, ReverserError::Video(crate::error::VideoError::ToolUnavailable { .. }))
        );
        assert!(!dir.path().join("reversed_videos").join("notes_reversed.mp4").exists());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.encoder.threads = 0;
        assert!(BatchDriver::new(config).is_err());
    }

    #[test]
    fn test_batch_status() {
        assert_eq!(batch_status(0, 3), ALL_REVERSED);
        assert_eq!(batch_status(1, 3), "⚠️ 1 of 3 videos failed");
        assert_eq!(batch_status(3, 3), "❌ All 3 videos failed");
    }

    #[test]
    fn test_remove_frames_keeps_foreign_files() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("clip");
        std::fs::create_dir_all(&folder).unwrap();
        let frames: Vec<_> = (0..3).map(|i| folder.join(frame_file_name(i))).collect();
        for frame in &frames {
            std::fs::write(frame, b"jpeg").unwrap();
        }
        std::fs::write(folder.join("notes.txt"), b"mine").unwrap();

        remove_frames(&folder, &frames);
        assert!(frames.iter().all(|f| !f.exists()));
        assert!(folder.join("notes.txt").exists());

        std::fs::remove_file(folder.join("notes.txt")).unwrap();
        remove_frames(&folder, &[]);
        assert!(!folder.exists());
    }

    #[cfg(unix)]
    fn fake_driver(root: &Path, duration: f64, keep_unrequested: bool) -> BatchDriver {
        let mut config = test_config(root);
        // The fake encoder input is not a real JPEG, so reassembly fails
        config.tools = fake_tools::tools_config(
            root,
            &fake_tools::frame_writer(100),
            &fake_tools::prober(duration, 10, "reversed"),
        );
        config.output.retain_unrequested_frames = keep_unrequested;
        BatchDriver::new(config).unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_reversal_removes_unrequested_frames() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"video").unwrap();
        let driver = fake_driver(dir.path(), 0.5, false);
        let folder = driver.config().frames_root().join("clip");

        let err = driver.extract_and_reverse(&source, false, None).await.unwrap_err();
        assert!(err.is_encode(), "unexpected error: {err}");
        assert!(!folder.exists());

        let err = driver.extract_and_reverse(&source, true, None).await.unwrap_err();
        assert!(err.is_encode());
        assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 5);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_frame_set_leaves_no_folder() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("blip.mp4");
        std::fs::write(&source, b"video").unwrap();
        let driver = fake_driver(dir.path(), 0.05, false);

        let err = driver.extract_and_reverse(&source, false, None).await.unwrap_err();
        assert!(err.is_encode());
        assert!(!driver.config().frames_root().join("blip").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_retained_frames_survive_a_failed_reversal() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"video").unwrap();
        let driver = fake_driver(dir.path(), 0.5, true);

        assert!(driver.extract_and_reverse(&source, false, None).await.is_err());
        assert_eq!(
            std::fs::read_dir(driver.config().frames_root().join("clip")).unwrap().count(),
            5
        );
    }
}
