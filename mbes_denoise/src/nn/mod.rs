//! Neural network modules for displacement prediction.

mod denoise_net;
pub mod mlp;
mod pointnet;

pub use denoise_net::DenoiseNet;
pub use mlp::{Mlp, MlpConfig};
pub use pointnet::PointEncoder;
