//! Shell-script stand-ins for `ffmpeg` and `ffprobe` used by unit tests

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;
use crate::video::ffmpeg::MediaTools;

/// Writes every frame `-frames:v` asks for when the filter pads the tail,
/// otherwise stops after `decoded` frames like a decoder hitting the stream end
pub fn frame_writer(decoded: usize) -> String {
    format!(
        r#"n=0; pad=0; prev=""
for arg in "$@"; do
  [ "$prev" = "-frames:v" ] && n=$arg
  case "$arg" in *tpad=*) pad=1 ;; esac
  prev=$arg; out=$arg
done
if [ "$pad" = 0 ] && [ "$n" -gt {decoded} ]; then n={decoded}; fi
i=0
while [ $i -lt $n ]; do
  printf jpeg > "$(printf "$out" $i)"
  i=$((i+1))
done"#
    )
}

/// Writes a few bytes to the output path, the last argument
pub const GARBAGE_WRITER: &str = r#"for arg in "$@"; do out=$arg; done
printf garbage > "$out""#;

/// Answers like `ffprobe -of json` for a clip of `duration` seconds at `fps`,
/// and rejects any path containing `reject`
pub fn prober(duration: f64, fps: u32, reject: &str) -> String {
    format!(
        r#"for arg in "$@"; do target=$arg; done
case "$target" in *{reject}*) echo "$target: Invalid data found" >&2; exit 1 ;; esac
echo '{{"streams":[{{"codec_name":"h264","width":320,"height":240,"avg_frame_rate":"{fps}/1","duration":"{duration}"}}]}}'"#
    )
}

pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn tools_config(dir: &Path, ffmpeg: &str, ffprobe: &str) -> ToolsConfig {
    ToolsConfig {
        ffmpeg: script(dir, "ffmpeg", ffmpeg),
        ffprobe: script(dir, "ffprobe", ffprobe),
    }
}

pub fn tools(dir: &Path, ffmpeg: &str, ffprobe: &str) -> MediaTools {
    MediaTools::new(&tools_config(dir, ffmpeg, ffprobe))
}
