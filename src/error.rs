//! Error kinds reported by the recording controller and its collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecorderError {
    /// Source enumeration or stream acquisition was refused or the device is unavailable
    #[error("Capture capability denied: {0}")]
    CapabilityDenied(String),

    /// start() without a captured stream
    #[error("No media recorder available. Please select a source first.")]
    NoActiveRecorder,

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Failed to save video to {path}: {message}")]
    WriteFailure { path: String, message: String },

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RecorderResult<T> = Result<T, RecorderError>;
