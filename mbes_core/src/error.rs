//! Error types for mbes_core operations.
//!
//! A plain error enum with no external dependencies so the crate stays `no_std` friendly.

use core::fmt;

/// Errors that can occur while evaluating point clouds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbesCoreError {
    /// A metric was asked to compare against a cloud without points.
    EmptyCloud,
    /// Index-matched comparison of clouds with different point counts.
    LengthMismatch {
        /// Number of points in the left-hand cloud.
        left: usize,
        /// Number of points in the right-hand cloud.
        right: usize,
    },
    /// A declared valid length is larger than the padded storage.
    LengthExceedsCapacity {
        /// Declared number of valid points.
        length: usize,
        /// Number of stored points.
        capacity: usize,
    },
}

impl fmt::Display for MbesCoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MbesCoreError::EmptyCloud => write!(f, "point cloud is empty"),
            MbesCoreError::LengthMismatch { left, right } => {
                write!(f, "point count mismatch: {} vs {}", left, right)
            }
            MbesCoreError::LengthExceedsCapacity { length, capacity } => {
                write!(
                    f,
                    "valid length {} exceeds padded capacity {}",
                    length, capacity
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MbesCoreError {}
