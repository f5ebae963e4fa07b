//! Multi-layer perceptron trained by plain back-propagation.
//!
//! The network keeps the whole training set as its input layer, so one
//! forward pass computes the activations of every sample at once. Row 0 of
//! the training set is a reserved all-zero sample: single-sample inference
//! uses the bias row trained against it.

use std::path::Path;
use std::time::Instant;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::matrix::{Matrix, MatrixError};
use crate::error::{AppError, Result};
use crate::store::{read_json, write_json};

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Delta and weight adjustment computed for one connection during back-propagation.
struct LayerDerivative {
    delta: Matrix,
    adjustment: Matrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    layers: Vec<Matrix>,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    output: Matrix,
    rate: f64,
    errors: Vec<f64>,
    time: f64,
    locale: String,
}

/// Layer sizes of a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLayers {
    pub input: usize,
    pub hidden: usize,
    pub output: usize,
}

/// Training diagnostics of a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingInfo {
    pub rate: f64,
    pub errors: Vec<f64>,
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub layers: NetworkLayers,
    pub training: TrainingInfo,
}

impl Network {
    /// Builds a network for the given training set with weights and biases
    /// drawn uniformly from [-1, 1).
    ///
    /// `input` and `output` hold one sample per row and must have the same
    /// number of rows.
    pub fn new(
        locale: &str,
        rate: f64,
        input: &Matrix,
        output: &Matrix,
        hidden_layers: &[usize],
    ) -> Result<Self> {
        Self::with_rng(locale, rate, input, output, hidden_layers, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        locale: &str,
        rate: f64,
        input: &Matrix,
        output: &Matrix,
        hidden_layers: &[usize],
        rng: &mut R,
    ) -> Result<Self> {
        if input.rows() != output.rows() {
            return Err(MatrixError::ShapeMismatch {
                op: "pair",
                left: input.shape(),
                right: output.shape(),
            }
            .into());
        }

        let input = input.with_leading_zero_row();
        let output = output.with_leading_zero_row();
        let samples = input.rows();

        let mut layers = Vec::with_capacity(hidden_layers.len() + 2);
        layers.push(input);
        for &nodes in hidden_layers {
            layers.push(Matrix::zeros(samples, nodes));
        }
        layers.push(output.clone());

        let mut weights = Vec::with_capacity(layers.len() - 1);
        let mut biases = Vec::with_capacity(layers.len() - 1);
        for pair in layers.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            weights.push(Matrix::random_with(from.columns(), to.columns(), rng));
            biases.push(Matrix::random_with(from.rows(), to.columns(), rng));
        }

        Ok(Self {
            layers,
            weights,
            biases,
            output,
            rate,
            errors: Vec::new(),
            time: 0.0,
            locale: locale.to_string(),
        })
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Mean error samples recorded during training.
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Total training time in seconds, rounded down to two decimals.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of input nodes (vocabulary size).
    pub fn input_size(&self) -> usize {
        self.layers[0].columns()
    }

    /// Number of output nodes (class count).
    pub fn output_size(&self) -> usize {
        self.output.columns()
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            layers: NetworkLayers {
                input: self.input_size(),
                hidden: self.layers.len() - 2,
                output: self.output_size(),
            },
            training: TrainingInfo {
                rate: self.rate,
                errors: self.errors.clone(),
                time: self.time,
            },
        }
    }

    /// Computes `sigmoid(layer . weights + biases)` for every connection and
    /// replaces the activations of the following layer.
    pub fn feed_forward(&mut self) -> Result<()> {
        for i in 0..self.layers.len() - 1 {
            let next = activate(&self.layers[i], &self.weights[i], &self.biases[i])?;
            self.layers[i + 1] = next;
        }
        Ok(())
    }

    /// Back-propagates the error of the last forward pass and adjusts every
    /// weight and bias matrix, last connection first.
    pub fn feed_backward(&mut self) -> Result<()> {
        let mut derivatives = vec![self.final_layer_derivative()?];
        for i in 0..self.layers.len() - 2 {
            let derivative = self.hidden_layer_derivative(i, &derivatives[i])?;
            derivatives.push(derivative);
        }

        let count = derivatives.len();
        for (i, derivative) in derivatives.iter().enumerate() {
            let l = count - i - 1;
            self.weights[l] = self.weights[l].add(&derivative.adjustment.scale(self.rate))?;
            self.biases[l] = self.biases[l].add(&derivative.delta.scale(self.rate))?;
        }
        Ok(())
    }

    fn final_layer_derivative(&self) -> Result<LayerDerivative> {
        let l = self.layers.len() - 1;
        let last = &self.layers[l];

        let cost = self.output.subtract(last)?;
        let sigmoid_derivative = last.hadamard(&last.map(|x| 1.0 - x))?;
        let delta = cost.scale(2.0).hadamard(&sigmoid_derivative)?;
        let adjustment = self.layers[l - 1].transpose().dot(&delta)?;

        Ok(LayerDerivative { delta, adjustment })
    }

    fn hidden_layer_derivative(
        &self,
        i: usize,
        previous: &LayerDerivative,
    ) -> Result<LayerDerivative> {
        let l = self.layers.len() - 2 - i;
        let hidden = &self.layers[l];

        let delta = previous
            .delta
            .dot(&self.weights[l].transpose())?
            .hadamard(&hidden.hadamard(&hidden.map(|x| 1.0 - x))?)?;
        let adjustment = self.layers[l - 1].transpose().dot(&delta)?;

        Ok(LayerDerivative { delta, adjustment })
    }

    /// Mean absolute difference between expected and actual outputs over all cells.
    pub fn compute_error(&mut self) -> Result<f64> {
        self.feed_forward()?;
        let last = &self.layers[self.layers.len() - 1];
        let errors = self.output.subtract(last)?;

        let cells = errors.rows() * errors.columns();
        if cells == 0 {
            return Ok(0.0);
        }
        Ok(errors.values().map(f64::abs).sum::<f64>() / cells as f64)
    }

    /// Runs a fixed number of forward/backward passes, sampling the error
    /// twenty times along the way.
    #[instrument(skip(self), fields(locale = %self.locale))]
    pub fn train(&mut self, iterations: usize) -> Result<()> {
        let start = Instant::now();
        let sample_every = (iterations / 20).max(1);

        for i in 0..iterations {
            self.feed_forward()?;
            self.feed_backward()?;

            if i % sample_every == 0 {
                let error = self.compute_error()?;
                debug!(iteration = i, error, "training progress");
                self.errors.push(error);
            }
        }

        let error = self.compute_error()?;
        self.time = (start.elapsed().as_secs_f64() * 100.0).floor() / 100.0;
        info!(
            "Trained the {} network in {:.2}s, error rate is {:.5}",
            self.locale, self.time, error
        );
        Ok(())
    }

    /// Runs one forward pass for a single input vector and returns the output row.
    ///
    /// The network itself is left untouched so a trained instance can be
    /// shared between concurrent callers.
    pub fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut layer = Matrix::row_vector(input);
        for i in 0..self.weights.len() {
            layer = activate(&layer, &self.weights[i], &self.biases[i])?;
        }
        Ok(layer.row(0).to_vec())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let network: Self = read_json(path)?;
        network.validate()?;
        Ok(network)
    }

    /// Checks that layers, weights and biases chain into a usable network.
    ///
    /// Every layer holds the same number of samples, at least the reserved
    /// zero sample, and each connection `i` has a `layers[i].columns x
    /// layers[i + 1].columns` weight matrix and a bias row per sample.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| {
            Err(AppError::Data(format!(
                "invalid {} network: {}",
                self.locale, reason
            )))
        };

        if self.layers.len() < 2 {
            return invalid(format!("{} layers, expected at least 2", self.layers.len()));
        }
        let connections = self.layers.len() - 1;
        if self.weights.len() != connections || self.biases.len() != connections {
            return invalid(format!(
                "{} weights and {} biases for {} connections",
                self.weights.len(),
                self.biases.len(),
                connections
            ));
        }

        let samples = self.layers[0].rows();
        if samples == 0 {
            return invalid("no training samples".to_string());
        }
        if let Some(i) = self.layers.iter().position(|layer| layer.rows() != samples) {
            return invalid(format!("layer {} does not hold {} samples", i, samples));
        }

        for (i, pair) in self.layers.windows(2).enumerate() {
            let (from, to) = (pair[0].columns(), pair[1].columns());
            if self.weights[i].shape() != (from, to) {
                return invalid(format!(
                    "weights {} are {:?}, expected {:?}",
                    i,
                    self.weights[i].shape(),
                    (from, to)
                ));
            }
            if self.biases[i].shape() != (samples, to) {
                return invalid(format!(
                    "biases {} are {:?}, expected {:?}",
                    i,
                    self.biases[i].shape(),
                    (samples, to)
                ));
            }
        }

        let last = self.layers[connections].shape();
        if self.output.shape() != last {
            return invalid(format!(
                "expected output is {:?}, last layer is {:?}",
                self.output.shape(),
                last
            ));
        }
        Ok(())
    }
}

/// `sigmoid(layer . weights + biases)`. When `layer` holds fewer samples than
/// the training set, the leading bias rows are used.
fn activate(layer: &Matrix, weights: &Matrix, biases: &Matrix) -> Result<Matrix> {
    let product = layer.dot(weights)?;
    let summed = if biases.rows() == product.rows() {
        product.add(biases)?
    } else {
        product.add(&biases.first_rows(product.rows())?)?
    };
    Ok(summed.map(sigmoid))
}
