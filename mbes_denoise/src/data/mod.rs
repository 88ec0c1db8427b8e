//! Data loading and the noise transform.

mod dataset;
mod patch;
mod pings;
mod tensor;
mod transform;

pub use dataset::MbesPatchDataset;
pub use patch::PatchSample;
pub use pings::{load_pings, parse_pings, Ping};
pub use tensor::{points_to_tensor, tensor_to_points};
pub use transform::{add_gaussian_noise, NoiseRange, NoiseTransform};
