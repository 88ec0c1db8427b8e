//! Loss functions for displacement training.

mod supervised;

pub use supervised::{length_mask, SupervisedLoss};
