//! MLP (Multi-Layer Perceptron) building blocks.

use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

/// Configuration for an MLP.
#[derive(Config, Debug)]
pub struct MlpConfig {
    /// Input dimension.
    pub input_dim: usize,
    /// Output dimension.
    pub output_dim: usize,
    /// Hidden layer dimensions.
    #[config(default = "vec![]")]
    pub hidden_dims: Vec<usize>,
}

impl MlpConfig {
    /// Initialize the MLP.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        let mut layers = Vec::new();
        let mut in_dim = self.input_dim;

        for &out_dim in &self.hidden_dims {
            layers.push(LinearConfig::new(in_dim, out_dim).init(device));
            in_dim = out_dim;
        }

        let output = LinearConfig::new(in_dim, self.output_dim).init(device);

        Mlp {
            layers,
            output,
            activation: Relu::new(),
        }
    }
}

/// Multi-Layer Perceptron with ReLU between layers and a linear output.
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    layers: Vec<Linear<B>>,
    output: Linear<B>,
    activation: Relu,
}

impl<B: Backend> Mlp<B> {
    /// Forward pass.
    ///
    /// Input shape: [batch, input_dim]
    /// Output shape: [batch, output_dim]
    pub fn forward(&self, mut x: Tensor<B, 2>) -> Tensor<B, 2> {
        for layer in &self.layers {
            x = layer.forward(x);
            x = self.activation.forward(x);
        }
        self.output.forward(x)
    }

    /// Forward pass for 3D input, applied independently to every row.
    ///
    /// Input shape: [batch, seq_len, input_dim]
    /// Output shape: [batch, seq_len, output_dim]
    pub fn forward_3d(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        let [batch, seq_len, input_dim] = x.dims();

        let x_flat = x.reshape([batch * seq_len, input_dim]);
        let y_flat = self.forward(x_flat);

        y_flat.reshape([batch, seq_len, self.output_dim()])
    }

    /// Output dimension.
    pub fn output_dim(&self) -> usize {
        self.output.weight.dims()[1]
    }
}
