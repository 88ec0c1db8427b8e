//! Error types for mbes_denoise.

use mbes_core::MbesCoreError;
use thiserror::Error;

/// Errors that can occur while loading data, training or denoising.
#[derive(Error, Debug)]
pub enum DenoiseError {
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Noise transform name not recognised.
    #[error("invalid transform type: {0}")]
    UnknownTransform(String),

    /// Tensor shape mismatch.
    #[error("tensor shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Clean and noisy data that must be index-aligned have different sizes.
    #[error("length mismatch in {context}: {left} vs {right}")]
    LengthMismatch {
        /// What was being paired.
        context: String,
        /// Left-hand length.
        left: usize,
        /// Right-hand length.
        right: usize,
    },

    /// Collation was asked to build a batch from no samples.
    #[error("cannot collate an empty batch")]
    EmptyBatch,

    /// Invalid or corrupted data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Checkpoint could not be written or read back.
    #[error("checkpoint error: {message}")]
    Checkpoint {
        /// Description of the error.
        message: String,
    },

    /// Metric evaluation failed.
    #[error("metric error: {0}")]
    Metric(#[from] MbesCoreError),

    /// Telemetry CSV could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DenoiseError {
    /// Shorthand for [`DenoiseError::InvalidConfig`].
    pub fn config(message: impl Into<String>) -> Self {
        DenoiseError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Shorthand for [`DenoiseError::Checkpoint`].
    pub fn checkpoint(message: impl Into<String>) -> Self {
        DenoiseError::Checkpoint {
            message: message.into(),
        }
    }
}

/// Result type for mbes_denoise operations.
pub type Result<T> = std::result::Result<T, DenoiseError>;
