use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;
use video_reverser::{
    batch::{BatchDriver, BatchOptions},
    config::Config,
    video::{types::frame_index, CombineOrder, FrameExtractor, MediaTools, VideoHandle, VideoProber},
};

fn ffmpeg_ready() -> bool {
    let encoders = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output();
    let probe = Command::new("ffprobe").arg("-version").stdin(Stdio::null()).output();

    match (encoders, probe) {
        (Ok(encoders), Ok(probe)) => {
            encoders.status.success()
                && probe.status.success()
                && String::from_utf8_lossy(&encoders.stdout).contains("libx264")
        }
        _ => false,
    }
}

macro_rules! require_ffmpeg {
    () => {
        if !ffmpeg_ready() {
            eprintln!("skipping: ffmpeg/ffprobe with libx264 not available");
            return;
        }
    };
}

/// Synthetic clip with a moving test pattern
fn make_clip(dir: &Path, name: &str, duration: f64, rate: u32) -> PathBuf {
    let path = dir.join(name);
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg(format!("testsrc=duration={}:size=160x120:rate={}", duration, rate))
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .arg(&path)
        .stdin(Stdio::null())
        .status()
        .expect("failed to execute ffmpeg");
    assert!(status.success(), "could not create {}", path.display());
    path
}

fn config(root: &Path) -> Config {
    let mut config = Config::default();
    config.paths.output_root = root.to_path_buf();
    config.encoder.threads = 2;
    config
}

fn prober(config: &Config) -> VideoProber {
    VideoProber::new(MediaTools::new(&config.tools))
}

async fn extract_all(config: &Config, frames_root: &Path, handle: &VideoHandle) -> Vec<PathBuf> {
    FrameExtractor::new(MediaTools::new(&config.tools), frames_root, &config.extraction)
        .extract(handle)
        .await
        .unwrap()
        .into_frames()
}

/// Mean absolute per-channel difference between two images of one size
fn mean_diff(a: &Path, b: &Path) -> f64 {
    let a = image::open(a).unwrap().to_rgb8();
    let b = image::open(b).unwrap().to_rgb8();
    assert_eq!(a.dimensions(), b.dimensions());

    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| (*x as i32 - *y as i32).unsigned_abs() as u64)
        .sum();
    total as f64 / a.as_raw().len() as f64
}

#[tokio::test]
async fn test_reverses_two_second_clip() {
    require_ffmpeg!();
    let work = TempDir::new().unwrap();
    let source = make_clip(work.path(), "clip.mp4", 2.0, 10);
    let config = config(&work.path().join("out"));
    let driver = BatchDriver::new(config.clone()).unwrap();

    let reversed = driver.extract_and_reverse(&source, true, None).await.unwrap();

    assert_eq!(reversed.frames.len(), 20);
    let frames_dir = config.frames_root().join("clip");
    for (i, frame) in reversed.frames.iter().enumerate() {
        assert_eq!(frame, &frames_dir.join(format!("frame_{:05}.jpg", i)));
        assert_eq!(frame_index(frame), Some(i));
        assert!(frame.is_file());
    }

    assert_eq!(reversed.output.path, config.videos_root().join("clip_reversed.mp4"));
    let handle = prober(&config).open(&reversed.output.path).await.unwrap();
    assert!((handle.fps - 10.0).abs() < 1e-6);
    assert_eq!(handle.frame_count(), 20);
    assert_eq!((handle.width, handle.height), (160, 120));

    // First output frame shows the last input frame
    let output_frames = extract_all(&config, &work.path().join("check"), &handle).await;
    assert_eq!(output_frames.len(), 20);
    let to_last = mean_diff(&output_frames[0], &reversed.frames[19]);
    let to_first = mean_diff(&output_frames[0], &reversed.frames[0]);
    assert!(to_last < to_first, "to_last={to_last} to_first={to_first}");
}

#[tokio::test]
async fn test_reversing_twice_keeps_count_and_rate() {
    require_ffmpeg!();
    let work = TempDir::new().unwrap();
    let source = make_clip(work.path(), "twice.mp4", 1.5, 10);
    let config = config(&work.path().join("out"));
    let driver = BatchDriver::new(config.clone()).unwrap();

    let once = driver.extract_and_reverse(&source, false, None).await.unwrap();
    let twice = driver.extract_and_reverse(&once.output.path, false, None).await.unwrap();

    assert_eq!(once.output.frame_count, 15);
    assert_eq!(twice.output.frame_count, 15);
    assert_eq!(twice.output.path, config.videos_root().join("twice_reversed_reversed.mp4"));

    let handle = prober(&config).open(&twice.output.path).await.unwrap();
    assert_eq!(handle.frame_count(), 15);
    assert!((handle.fps - 10.0).abs() < 1e-6);

    // Frames were not requested, so they are gone
    assert!(once.frames.is_empty());
    assert!(!config.frames_root().join("twice").exists());
}

#[tokio::test]
async fn test_single_frame_clip() {
    require_ffmpeg!();
    let work = TempDir::new().unwrap();
    let source = make_clip(work.path(), "blink.mp4", 0.1, 10);
    let config = config(&work.path().join("out"));
    let driver = BatchDriver::new(config.clone()).unwrap();

    let reversed = driver.extract_and_reverse(&source, true, None).await.unwrap();
    assert_eq!(reversed.frames.len(), 1);
    assert_eq!(reversed.output.frame_count, 1);
    assert!(reversed.output.file_size > 0);

    let handle = prober(&config).open(&reversed.output.path).await.unwrap();
    assert_eq!(handle.frame_count(), 1);
}

#[tokio::test]
async fn test_combined_durations_and_order() {
    require_ffmpeg!();
    let work = TempDir::new().unwrap();
    let source = make_clip(work.path(), "loop.mp4", 1.0, 10);
    let config = config(&work.path().join("out"));
    let driver = BatchDriver::new(config.clone()).unwrap();
    let prober = prober(&config);

    let reversed = driver.extract_and_reverse(&source, false, None).await.unwrap();
    let ab = driver.combine_clips(&reversed, CombineOrder::Ab).await.unwrap();
    let ba = driver.combine_clips(&reversed, CombineOrder::Ba).await.unwrap();

    assert_eq!(ab.path, config.videos_root().join("loop_combo_ab.mp4"));
    assert_eq!(ba.path, config.videos_root().join("loop_combo_ba.mp4"));

    let ab_handle = prober.open(&ab.path).await.unwrap();
    let ba_handle = prober.open(&ba.path).await.unwrap();
    for handle in [&ab_handle, &ba_handle] {
        assert!((handle.duration - 2.0).abs() <= 0.1 + 1e-6, "duration {}", handle.duration);
    }

    let source_handle = prober.open(&source).await.unwrap();
    let source_frames = extract_all(&config, &work.path().join("src"), &source_handle).await;
    let ab_frames = extract_all(&config, &work.path().join("ab"), &ab_handle).await;
    let ba_frames = extract_all(&config, &work.path().join("ba"), &ba_handle).await;

    // ab opens on the original's first frame, ba on the reversed clip's first frame
    let last = source_frames.len() - 1;
    assert!(mean_diff(&ab_frames[0], &source_frames[0]) < mean_diff(&ab_frames[0], &source_frames[last]));
    assert!(mean_diff(&ba_frames[0], &source_frames[last]) < mean_diff(&ba_frames[0], &source_frames[0]));
}

#[tokio::test]
async fn test_batch_continues_past_unreadable_input() {
    require_ffmpeg!();
    let work = TempDir::new().unwrap();
    let bogus = work.path().join("notes.mp4");
    std::fs::write(&bogus, b"not a video").unwrap();
    let good = make_clip(work.path(), "good.mp4", 0.5, 10);
    let config = config(&work.path().join("out"));
    let driver = BatchDriver::new(config.clone()).unwrap();

    let options = BatchOptions {
        keep_frames: true,
        combine: Some(CombineOrder::Ba),
        output_name: None,
    };
    let report = driver.process_batch(&[bogus.clone(), good.clone()], &options).await.unwrap();

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.original.as_deref(), Some(bogus.as_path()));
    assert_eq!(report.reversed, Some(config.videos_root().join("good_reversed.mp4")));
    assert_eq!(report.combined, vec![config.videos_root().join("good_combo_ba.mp4")]);
    assert_eq!(report.frames.len(), 5);
    assert!(!config.videos_root().join("notes_reversed.mp4").exists());

    let err = driver.extract_and_reverse(&bogus, false, None).await.unwrap_err();
    assert!(err.is_media_open());
}

#[tokio::test]
async fn test_explicit_output_name() {
    require_ffmpeg!();
    let work = TempDir::new().unwrap();
    let source = make_clip(work.path(), "named.mp4", 0.5, 10);
    let config = config(&work.path().join("out"));
    let driver = BatchDriver::new(config.clone()).unwrap();

    let options = BatchOptions {
        keep_frames: false,
        combine: Some(CombineOrder::Ab),
        output_name: Some("backwards.mp4".to_string()),
    };
    let report = driver.process_batch(&[source], &options).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.reversed, Some(config.videos_root().join("backwards.mp4")));
    assert_eq!(report.combined, vec![config.videos_root().join("backwards_combo_ab.mp4")]);
    assert!(report.frames.is_empty());
}
