//! # mbes_core
//!
//! Pure point-cloud primitives for multibeam echosounder (MBES) denoising.
//!
//! This crate holds the parts of the denoising pipeline that need no tensor
//! backend: the [`Point3`] type, slice helpers for padded clouds, and the two
//! evaluation metrics used at validation time.
//!
//! ## Features
//!
//! - **no_std compatible**: no allocation anywhere in the crate
//! - **Chamfer distance**: symmetric nearest-neighbour metric, mean reduced
//! - **Point-correspondence distance**: index-matched mean Euclidean error
//!
//! ## Feature Flags
//!
//! - `std` (default): implements `std::error::Error` for [`MbesCoreError`]
//!
//! ## Usage
//!
//! ```
//! use mbes_core::prelude::*;
//!
//! let clean = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
//! let denoised = [Point3::new(0.0, 0.0, 0.1), Point3::new(1.0, 0.0, 0.1)];
//!
//! let cd = chamfer_distance(&denoised, &clean).unwrap();
//! let diff = point_correspondence_distance(&denoised, &clean).unwrap();
//! assert!(cd > 0.0 && (diff - 0.1).abs() < 1e-6);
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "std")]
extern crate std;

pub mod cloud;
pub mod error;
pub mod metrics;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cloud::{centroid, subtract_offset_in_place, valid_prefix};
    pub use crate::error::MbesCoreError;
    pub use crate::metrics::{
        chamfer_distance, mean, nearest_squared_distance, point_correspondence_distance,
    };
    pub use crate::types::Point3;
}

pub use cloud::{centroid, subtract_offset_in_place, valid_prefix};
pub use error::MbesCoreError;
pub use metrics::{chamfer_distance, mean, nearest_squared_distance, point_correspondence_distance};
pub use types::Point3;
