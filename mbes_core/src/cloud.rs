//! Helpers over borrowed point slices.
//!
//! Clouds are plain `&[Point3]`; padded storage is described by a slice plus an
//! explicit valid length.

use crate::error::MbesCoreError;
use crate::types::Point3;

/// Return the meaningful prefix of padded point storage.
///
/// Fails when `length` exceeds the number of stored points.
pub fn valid_prefix(points: &[Point3], length: usize) -> Result<&[Point3], MbesCoreError> {
    if length > points.len() {
        return Err(MbesCoreError::LengthExceedsCapacity {
            length,
            capacity: points.len(),
        });
    }
    Ok(&points[..length])
}

/// Mean position of the cloud, or `None` when empty.
pub fn centroid(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }

    let mut sum = Point3::ZERO;
    for p in points {
        sum += *p;
    }

    Some(sum / points.len() as f32)
}

/// Subtract `offset` from every point in place.
pub fn subtract_offset_in_place(points: &mut [Point3], offset: Point3) {
    for p in points {
        *p -= offset;
    }
}
