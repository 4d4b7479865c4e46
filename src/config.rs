use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the video reverser
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where frames and outputs are written
    pub paths: PathsConfig,

    /// External media tools
    pub tools: ToolsConfig,

    /// Frame extraction settings
    pub extraction: ExtractionConfig,

    /// Encoder settings shared by reassembly and combination
    pub encoder: EncoderConfig,

    /// Output file handling
    pub output: OutputConfig,

    /// Batch behaviour
    pub batch: BatchConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.paths.validate()?;
        self.tools.validate()?;
        self.extraction.validate()?;
        self.encoder.validate()?;
        Ok(())
    }

    /// Folder holding one sub-folder of frames per video
    pub fn frames_root(&self) -> PathBuf {
        self.paths.output_root.join(&self.paths.frames_dir)
    }

    /// Folder holding reversed and combined videos
    pub fn videos_root(&self) -> PathBuf {
        self.paths.output_root.join(&self.paths.videos_dir)
    }
}

/// Directory of the running executable, falling back to the working directory
pub fn program_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn invalid<K: Into<String>, V: ToString>(key: K, value: V) -> crate::error::ReverserError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.to_string(),
    }
    .into()
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Base directory for all generated files
    pub output_root: PathBuf,

    /// Sub-directory of `output_root` for extracted frames
    pub frames_dir: String,

    /// Sub-directory of `output_root` for encoded videos
    pub videos_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_root: program_dir(),
            frames_dir: "extracted_frames".to_string(),
            videos_dir: "reversed_videos".to_string(),
        }
    }
}

impl PathsConfig {
    fn validate(&self) -> Result<()> {
        for (key, value) in [("paths.frames_dir", &self.frames_dir), ("paths.videos_dir", &self.videos_dir)] {
            if value.trim().is_empty() {
                return Err(invalid(key, value));
            }
        }

        if self.frames_dir == self.videos_dir {
            return Err(invalid("paths.videos_dir", &self.videos_dir));
        }

        Ok(())
    }
}

/// Names or paths of the FFmpeg binaries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl ToolsConfig {
    fn validate(&self) -> Result<()> {
        if self.ffmpeg.as_os_str().is_empty() {
            return Err(invalid("tools.ffmpeg", "\"\""));
        }
        if self.ffprobe.as_os_str().is_empty() {
            return Err(invalid("tools.ffprobe", "\"\""));
        }
        Ok(())
    }
}

/// Frame extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// JPEG quality passed as `-q:v` (2 is best, 31 is worst)
    pub jpeg_quality: u8,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { jpeg_quality: 2 }
    }
}

impl ExtractionConfig {
    fn validate(&self) -> Result<()> {
        if !(2..=31).contains(&self.jpeg_quality) {
            return Err(invalid("extraction.jpeg_quality", self.jpeg_quality));
        }
        Ok(())
    }
}

/// Video encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// FFmpeg encoder name
    pub codec: String,

    /// Output pixel format
    pub pixel_format: String,

    /// Constant rate factor (0-51, lower is better)
    pub crf: u8,

    /// Encoder threads
    pub threads: usize,

    /// Container extension for derived output names
    pub extension: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            crf: 18,
            threads: num_cpus::get(),
            extension: "mp4".to_string(),
        }
    }
}

impl EncoderConfig {
    fn validate(&self) -> Result<()> {
        if self.codec.trim().is_empty() {
            return Err(invalid("encoder.codec", &self.codec));
        }

        if self.crf > 51 {
            return Err(invalid("encoder.crf", self.crf));
        }

        if self.threads == 0 {
            return Err(invalid("encoder.threads", self.threads));
        }

        if self.extension.is_empty() || self.extension.contains(['.', '/', '\\']) {
            return Err(invalid("encoder.extension", &self.extension));
        }

        Ok(())
    }

    /// Encoder arguments shared by every ffmpeg output this crate writes
    pub fn output_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-threads".to_string(),
            self.threads.to_string(),
            "-an".to_string(),
        ]
    }
}

/// What to do when an output file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnExisting {
    /// Replace the existing file
    #[default]
    Overwrite,
    /// Keep the existing file and write a timestamped sibling
    Version,
}

/// Output file handling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub on_existing: OnExisting,

    /// Leave frame folders on disk even when keep-frames was not requested
    pub retain_unrequested_frames: bool,
}

/// Batch behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Abort the whole batch on the first failing video
    pub stop_on_error: bool,
}
