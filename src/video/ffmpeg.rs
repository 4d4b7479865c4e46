use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tokio::task;
use tracing::debug;

use crate::config::ToolsConfig;
use crate::error::{Result, ReverserError, VideoError};

/// Thin wrapper around the `ffmpeg` and `ffprobe` executables
#[derive(Debug, Clone)]
pub struct MediaTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl MediaTools {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
        }
    }

    /// Whether `ffmpeg -version` runs successfully
    pub fn check_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Base `ffmpeg` command, quiet and non-interactive
    pub fn ffmpeg_command(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Run `ffprobe` with the given arguments on the blocking pool
    pub async fn ffprobe<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(args.into_iter().map(Into::into));
        cmd.stdin(Stdio::null());
        run_blocking(cmd, &self.ffprobe).await
    }

    /// Run a prepared `ffmpeg` command on the blocking pool
    pub async fn run_ffmpeg(&self, cmd: Command) -> Result<Output> {
        run_blocking(cmd, &self.ffmpeg).await
    }

    /// Run `ffmpeg`, streaming the bytes of `inputs` to its stdin in order
    ///
    /// A feeder thread writes stdin while this side drains stderr, so a
    /// chatty encoder cannot stall the pipe.
    pub async fn run_ffmpeg_with_input(&self, mut cmd: Command, inputs: Vec<PathBuf>) -> Result<Output> {
        debug!("Running {:?} with {} piped inputs", cmd, inputs.len());
        let tool_name = self.ffmpeg.display().to_string();

        let (output, fed) = task::spawn_blocking(move || -> std::io::Result<_> {
            cmd.stdin(Stdio::piped()).stdout(Stdio::null()).stderr(Stdio::piped());
            let mut child = cmd.spawn()?;
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin not captured"))?;

            let feeder = std::thread::spawn(move || -> std::io::Result<()> {
                for input in &inputs {
                    let bytes = std::fs::read(input)?;
                    stdin.write_all(&bytes)?;
                }
                stdin.flush()
            });

            let output = child.wait_with_output()?;
            let fed = feeder
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("feeder thread panicked")));
            Ok((output, fed))
        })
        .await
        .map_err(|e| ReverserError::generic(format!("Failed to join {} task: {}", tool_name, e)))?
        .map_err(|e| VideoError::ToolUnavailable {
            tool: tool_name.clone(),
            reason: e.to_string(),
        })?;

        // A failed exit explains a broken pipe better than the pipe error does
        if output.status.success() {
            fed?;
        }
        Ok(output)
    }
}

async fn run_blocking(mut cmd: Command, tool: &Path) -> Result<Output> {
    debug!("Running {:?}", cmd);
    let tool_name = tool.display().to_string();

    task::spawn_blocking(move || cmd.output())
        .await
        .map_err(|e| ReverserError::generic(format!("Failed to join {} task: {}", tool_name, e)))?
        .map_err(|e| {
            VideoError::ToolUnavailable {
                tool: tool_name.clone(),
                reason: e.to_string(),
            }
            .into()
        })
}

/// Last non-empty stderr line, for error messages
pub fn stderr_summary(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("exited with {}", output.status))
}
