//! Error type shared by the capture loop and its parts.

use thiserror::Error;

/// Errors that end a capture session
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Video error: {0}")]
    Video(#[from] anyhow::Error),

    #[error("Window error: {0}")]
    Window(String),
}

pub type CaptureResult<T> = Result<T, CaptureError>;
