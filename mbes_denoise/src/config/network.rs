//! Denoising network configuration.

use burn::config::Config;

/// Configuration for the displacement-predicting network.
///
/// A shared per-point MLP produces point features; a length-masked max pool
/// turns them into a patch feature; the decoder maps
/// `[xyz, point feature, patch feature]` to a 3D displacement.
#[derive(Config, Debug)]
pub struct DenoiseNetConfig {
    /// Hidden layer dimensions of the per-point encoder.
    #[config(default = "vec![64, 128]")]
    pub encoder_dims: Vec<usize>,

    /// Dimension of the per-point feature.
    #[config(default = 128)]
    pub point_feature_dim: usize,

    /// Hidden layer dimensions of the displacement decoder.
    #[config(default = "vec![256, 128, 64]")]
    pub decoder_dims: Vec<usize>,
}

impl Default for DenoiseNetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DenoiseNetConfig {
    /// Input dimension of the decoder.
    pub fn decoder_input_dim(&self) -> usize {
        3 + 2 * self.point_feature_dim
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.point_feature_dim == 0 {
            return Err("point_feature_dim must be positive".to_string());
        }
        if self.encoder_dims.contains(&0) || self.decoder_dims.contains(&0) {
            return Err("hidden layer dimensions must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_input_dim() {
        let config = DenoiseNetConfig::new().with_point_feature_dim(32);
        assert_eq!(config.decoder_input_dim(), 67);
    }

    #[test]
    fn test_zero_width_layer_is_rejected() {
        let config = DenoiseNetConfig::new().with_decoder_dims(vec![64, 0]);
        assert!(config.validate().is_err());
    }
}
