use thiserror::Error;

/// Main error type for the video reverser
#[derive(Error, Debug)]
pub enum ReverserError {
    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while opening, sampling or encoding media
#[derive(Error, Debug)]
pub enum VideoError {
    /// The source could not be opened or probed
    #[error("Failed to open media '{path}': {reason}")]
    MediaOpen { path: String, reason: String },

    /// A frame could not be sampled during extraction
    #[error("Failed to sample frame {index}: {reason}")]
    FrameSample { index: usize, reason: String },

    /// Writing a reassembled or combined video failed
    #[error("Video encoding failed: {reason}")]
    Encode { reason: String },

    /// The external media tool could not be started at all
    #[error("Media tool '{tool}' unavailable: {reason}")]
    ToolUnavailable { tool: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Batch-level errors
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Batch aborted while processing '{path}': {source}")]
    Aborted {
        path: String,
        #[source]
        source: Box<ReverserError>,
    },
}

/// Convenience type alias for Results using ReverserError
pub type Result<T> = std::result::Result<T, ReverserError>;

impl ReverserError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    pub fn media_open<P: Into<String>, R: Into<String>>(path: P, reason: R) -> Self {
        VideoError::MediaOpen { path: path.into(), reason: reason.into() }.into()
    }

    pub fn frame_sample<R: Into<String>>(index: usize, reason: R) -> Self {
        VideoError::FrameSample { index, reason: reason.into() }.into()
    }

    pub fn encode<R: Into<String>>(reason: R) -> Self {
        VideoError::Encode { reason: reason.into() }.into()
    }

    pub fn is_media_open(&self) -> bool {
        matches!(self, Self::Video(VideoError::MediaOpen { .. }))
    }

    pub fn is_frame_sample(&self) -> bool {
        matches!(self, Self::Video(VideoError::FrameSample { .. }))
    }

    pub fn is_encode(&self) -> bool {
        matches!(self, Self::Video(VideoError::Encode { .. }))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::MediaOpen { path, .. }) => {
                format!("Could not open video '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Video(VideoError::ToolUnavailable { tool, .. }) => {
                format!("'{}' was not found. Please install FFmpeg and make sure it is on your PATH.", tool)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Batch(BatchError::Aborted { path, source }) => {
                format!("Stopped at '{}': {}", path, source.user_message())
            }
            _ => self.to_string(),
        }
    }
}
