//! Error types for page extraction.

use docraster_process::RunError;
use thiserror::Error;

/// Result type for extraction operations.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Errors that can occur while extracting page images.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The requested image format has no rasterizer switch.
    #[error("{0} is not a supported {1} format")]
    UnsupportedFormat(String, &'static str),

    /// The rasterizer failed, timed out, or could not be started.
    #[error(transparent)]
    Run(#[from] RunError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractError {
    /// Output of the rasterizer, when it got far enough to produce any.
    pub fn tool_output(&self) -> Option<std::borrow::Cow<'_, str>> {
        match self {
            ExtractError::Run(err) if !err.output().is_empty() => Some(err.output_text()),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for ExtractError {
    fn from(err: serde_yaml::Error) -> Self {
        ExtractError::Config(err.to_string())
    }
}
