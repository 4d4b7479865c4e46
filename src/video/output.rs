use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::config::OnExisting;
use crate::error::{Result, ReverserError};
use crate::video::types::{EncodedVideo, OutputName};

/// Where `name` is written inside `dir` under the given policy
///
/// `Version` keeps an existing file and picks
/// `<stem>_<YYYYmmdd-HHMMSS>.<ext>`, then `..._<k>.<ext>` while taken.
pub fn resolve_output_path(dir: &Path, name: &OutputName, on_existing: OnExisting) -> PathBuf {
    let path = dir.join(name.file_name());
    if on_existing == OnExisting::Overwrite || !path.exists() {
        return path;
    }

    let stamped = format!("{}_{}", name.stem(), Local::now().format("%Y%m%d-%H%M%S"));
    let mut candidate = dir.join(format!("{}.{}", stamped, name.extension()));
    let mut k = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", stamped, k, name.extension()));
        k += 1;
    }

    info!("{} exists, writing {} instead", path.display(), candidate.display());
    candidate
}

/// Report on a freshly encoded file; a missing or empty file is an encode error
pub fn describe_output(path: &Path, fps: f64, frame_count: usize) -> Result<EncodedVideo> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ReverserError::encode(format!("output {} was not written: {}", path.display(), e)))?;

    if metadata.len() == 0 {
        return Err(ReverserError::encode(format!("output {} is empty", path.display())));
    }

    debug!("{}: {} bytes", path.display(), metadata.len());

    Ok(EncodedVideo {
        path: path.to_path_buf(),
        fps,
        duration: if fps > 0.0 { frame_count as f64 / fps } else { 0.0 },
        frame_count,
        file_size: metadata.len(),
    })
}
