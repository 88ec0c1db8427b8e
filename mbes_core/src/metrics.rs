//! Evaluation metrics between a denoised cloud and its ground truth.
//!
//! Both metrics are brute force (`O(N·M)` for Chamfer) and allocation free.
//! NaN coordinates are never skipped: a single NaN point makes the metric NaN,
//! so numerical blow-ups in the denoiser stay visible to the caller.

use crate::error::MbesCoreError;
use crate::types::Point3;

/// Smallest squared distance from `query` to any point of `cloud`.
///
/// Returns `f32::INFINITY` for an empty cloud and NaN if any distance is NaN.
pub fn nearest_squared_distance(query: Point3, cloud: &[Point3]) -> f32 {
    let mut best = f32::INFINITY;
    for p in cloud {
        let d = query.distance_squared(*p);
        if d.is_nan() {
            return f32::NAN;
        }
        if d < best {
            best = d;
        }
    }
    best
}

/// Mean over `from` of the squared distance to the nearest point in `to`.
fn directed_chamfer(from: &[Point3], to: &[Point3]) -> f32 {
    let mut sum = 0.0f64;
    for p in from {
        sum += nearest_squared_distance(*p, to) as f64;
    }
    (sum / from.len() as f64) as f32
}

/// Symmetric Chamfer distance with mean point reduction.
///
/// `mean_i min_j |a_i - b_j|² + mean_j min_i |b_j - a_i|²`. The clouds may have
/// different sizes but neither may be empty.
pub fn chamfer_distance(a: &[Point3], b: &[Point3]) -> Result<f32, MbesCoreError> {
    if a.is_empty() || b.is_empty() {
        return Err(MbesCoreError::EmptyCloud);
    }
    Ok(directed_chamfer(a, b) + directed_chamfer(b, a))
}

/// Mean Euclidean distance between index-matched points.
///
/// Only meaningful when the denoiser preserved point count and order, so a
/// length mismatch is an error rather than a truncation.
pub fn point_correspondence_distance(a: &[Point3], b: &[Point3]) -> Result<f32, MbesCoreError> {
    if a.len() != b.len() {
        return Err(MbesCoreError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(MbesCoreError::EmptyCloud);
    }

    let mut sum = 0.0f64;
    for (p, q) in a.iter().zip(b) {
        sum += p.distance(*q) as f64;
    }
    Ok((sum / a.len() as f64) as f32)
}

/// Arithmetic mean of per-sample metric values.
///
/// Returns NaN for an empty slice, matching the behaviour of averaging an empty
/// validation set.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return f32::NAN;
    }
    let sum: f64 = values.iter().map(|v| *v as f64).sum();
    (sum / values.len() as f64) as f32
}
