//! Training and validation metrics.

use mbes_core::{chamfer_distance, mean, point_correspondence_distance, Point3};

use crate::error::Result;

/// Metrics for a single optimizer step.
#[derive(Debug, Clone, Default)]
pub struct TrainMetrics {
    /// Global step index.
    pub step: usize,
    /// Supervised loss.
    pub loss: f32,
    /// Global gradient norm before clipping.
    pub grad_norm: f64,
    /// Learning rate used for the step.
    pub learning_rate: f64,
}

impl TrainMetrics {
    /// Create new training metrics.
    pub fn new(step: usize, loss: f32, grad_norm: f64, learning_rate: f64) -> Self {
        Self {
            step,
            loss,
            grad_norm,
            learning_rate,
        }
    }

    /// Log the training line.
    pub fn log(&self) {
        log::info!(
            "[Train] Iter {:04} | Loss {:.6} | Grad {:.6}",
            self.step,
            self.loss,
            self.grad_norm
        );
    }
}

/// Running sums of loss and gradient norm between two log lines.
#[derive(Debug, Clone, Default)]
pub struct TrainWindow {
    loss: f64,
    grad_norm: f64,
    count: usize,
}

impl TrainWindow {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one step.
    pub fn push(&mut self, metrics: &TrainMetrics) {
        self.loss += metrics.loss as f64;
        self.grad_norm += metrics.grad_norm;
        self.count += 1;
    }

    /// Steps accumulated since the last reset.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True when nothing was accumulated.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Window averages reported at `last`'s step and learning rate, then reset.
    ///
    /// Returns `None` for an empty window.
    pub fn take(&mut self, last: &TrainMetrics) -> Option<TrainMetrics> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let averaged = TrainMetrics::new(
            last.step,
            (self.loss / n) as f32,
            self.grad_norm / n,
            last.learning_rate,
        );
        *self = Self::default();
        Some(averaged)
    }
}

/// Metrics of one denoised validation patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleMetrics {
    /// Chamfer distance to the clean patch.
    pub chamfer: f32,
    /// Mean point-correspondence distance to the clean patch.
    pub diff: f32,
}

impl SampleMetrics {
    /// Evaluate a denoised patch against its clean counterpart.
    pub fn evaluate(denoised: &[Point3], clean: &[Point3]) -> Result<Self> {
        Ok(Self {
            chamfer: chamfer_distance(denoised, clean)?,
            diff: point_correspondence_distance(denoised, clean)?,
        })
    }
}

/// Result of one validation pass.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Global step at which validation ran.
    pub step: usize,
    /// Per-patch metrics, in validation order.
    pub samples: Vec<SampleMetrics>,
}

impl ValidationReport {
    /// Create a report.
    pub fn new(step: usize, samples: Vec<SampleMetrics>) -> Self {
        Self { step, samples }
    }

    /// Mean Chamfer distance; NaN for an empty report.
    pub fn chamfer(&self) -> f32 {
        let values: Vec<f32> = self.samples.iter().map(|s| s.chamfer).collect();
        mean(&values)
    }

    /// Mean point-correspondence distance; NaN for an empty report.
    pub fn diff(&self) -> f32 {
        let values: Vec<f32> = self.samples.iter().map(|s| s.diff).collect();
        mean(&values)
    }

    /// Score used to rank checkpoints; lower is better.
    pub fn score(&self) -> f32 {
        self.diff()
    }

    /// Number of validated patches.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True when nothing was validated.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Log the validation line.
    pub fn log(&self) {
        log::info!(
            "[Val] Iter {:04} | CD {:.6} | Diff {:.6}",
            self.step,
            self.chamfer(),
            self.diff()
        );
    }
}
