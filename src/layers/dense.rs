use rand::Rng;
use tracing::warn;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetError, Result};
use crate::layers::gradient::GradientAccumulator;
use crate::layers::init::InitRange;
use crate::math::matrix::Matrix;

/// One dense layer: `size` nodes, each reading every one of `input_size` inputs.
#[derive(Debug, Clone)]
pub struct Layer {
    biases: Vec<f64>,
    weights: Matrix,
    gradient: GradientAccumulator,
    raw_outputs: Vec<f64>,       // z = Wx + b, kept for the derivative in backprop
    activated_outputs: Vec<f64>, // a = f(z)
}

impl Layer {
    /// Fresh layer with uniformly drawn weights and zero biases.
    pub fn new<R: Rng + ?Sized>(size: usize, input_size: usize, init: &InitRange, rng: &mut R) -> Result<Layer> {
        init.validate()?;
        if size == 0 || input_size == 0 {
            return Err(NetError::InvalidArgument(format!(
                "layer needs at least one node and one input, got {size}x{input_size}"
            )));
        }
        Ok(Layer::assemble(vec![0.0; size], Matrix::uniform(size, input_size, init.low, init.high, rng)))
    }

    /// Restores a layer from stored parameters.
    pub fn from_parts(biases: Vec<f64>, weights: Matrix) -> Result<Layer> {
        if biases.is_empty() || weights.cols == 0 {
            return Err(NetError::InvalidArgument("layer needs at least one node and one input".into()));
        }
        if biases.len() != weights.rows {
            return Err(NetError::shape("layer weight rows", biases.len(), weights.rows));
        }
        if !biases.iter().all(|b| b.is_finite()) || !weights.all_finite() {
            return Err(NetError::MalformedRecord("layer parameters must be finite".into()));
        }
        Ok(Layer::assemble(biases, weights))
    }

    fn assemble(biases: Vec<f64>, weights: Matrix) -> Layer {
        Layer {
            gradient: GradientAccumulator::new(weights.rows, weights.cols),
            biases,
            weights,
            raw_outputs: Vec::new(),
            activated_outputs: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.biases.len()
    }

    pub fn input_size(&self) -> usize {
        self.weights.cols
    }

    pub fn parameter_count(&self) -> usize {
        self.biases.len() + self.weights.len()
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn gradient(&self) -> &GradientAccumulator {
        &self.gradient
    }

    /// Pre-activation values from the most recent `calculate`.
    pub fn raw_outputs(&self) -> &[f64] {
        &self.raw_outputs
    }

    pub fn activated_outputs(&self) -> &[f64] {
        &self.activated_outputs
    }

    /// Forward pass for a fixed shape. Overwrites the stored raw and activated
    /// outputs and returns a copy of the latter.
    pub fn calculate(&mut self, inputs: &[f64], activation: ActivationFunction) -> Result<Vec<f64>> {
        if inputs.len() != self.input_size() {
            return Err(NetError::shape("layer input", self.input_size(), inputs.len()));
        }

        let z: Vec<f64> = self.weights.iter_rows().zip(&self.biases)
            .map(|(row, b)| b + row.iter().zip(inputs).map(|(w, x)| w * x).sum::<f64>())
            .collect();
        let a: Vec<f64> = z.iter().map(|&x| activation.function(x)).collect();

        self.raw_outputs = z;
        self.activated_outputs = a.clone();
        Ok(a)
    }

    /// Changes how many inputs every node reads. New inputs get zero weights
    /// (and zero accumulated gradient); shrinking drops the trailing columns.
    pub fn resize_input_width(&mut self, new_width: usize) -> Result<()> {
        if new_width == 0 {
            return Err(NetError::InvalidArgument("layer input width must be at least 1".into()));
        }
        if new_width != self.input_size() {
            warn!(from = self.input_size(), to = new_width, nodes = self.size(), "resizing layer input width");
            self.weights.resize_cols(new_width);
            self.gradient.resize_cols(new_width);
        }
        Ok(())
    }

    /// Resizes the layer to fit `inputs`, then runs the forward pass.
    pub fn calculate_adjusting(&mut self, inputs: &[f64], activation: ActivationFunction) -> Result<Vec<f64>> {
        self.resize_input_width(inputs.len())?;
        self.calculate(inputs, activation)
    }

    /// Accumulates this layer's gradient for one sample and returns the error
    /// to hand to the layer upstream.
    ///
    /// `errors` is dC/da for each node of this layer. `backward_outputs` are
    /// the values that fed this layer on the last `calculate` (the previous
    /// layer's activated outputs, or the network input for the first layer).
    ///
    /// The returned vector is dC/da for the upstream layer and has not been
    /// multiplied by that layer's activation derivative yet; its own
    /// `update_gradient` does that. `errors` is left untouched.
    pub fn update_gradient(
        &mut self,
        activation: ActivationFunction,
        errors: &[f64],
        backward_outputs: &[f64],
    ) -> Result<Vec<f64>> {
        if errors.len() != self.size() {
            return Err(NetError::shape("layer errors", self.size(), errors.len()));
        }
        if backward_outputs.len() != self.input_size() {
            return Err(NetError::shape("layer backward outputs", self.input_size(), backward_outputs.len()));
        }
        if self.raw_outputs.len() != self.size() {
            return Err(NetError::shape("layer raw outputs (calculate not run)", self.size(), self.raw_outputs.len()));
        }

        let deltas: Vec<f64> = errors.iter().zip(&self.raw_outputs)
            .map(|(e, &z)| e * activation.derivative(z))
            .collect();

        self.gradient.accumulate(&deltas, backward_outputs);

        let mut backward_errors = vec![0.0; self.input_size()];
        for (row, delta) in self.weights.iter_rows().zip(&deltas) {
            for (be, w) in backward_errors.iter_mut().zip(row) {
                *be += w * delta;
            }
        }
        Ok(backward_errors)
    }

    /// Steps every parameter by `-(gradient / batch_size) * learn_rate` and
    /// zeroes the accumulator.
    pub fn apply_gradient(&mut self, batch_size: usize, learn_rate: f64) -> Result<()> {
        self.gradient.apply_and_reset(&mut self.biases, &mut self.weights, batch_size, learn_rate)
    }

    /// Fails if `apply_gradient` with the same arguments would be refused.
    pub fn check_gradient_step(&self, batch_size: usize, learn_rate: f64) -> Result<()> {
        self.gradient.check_step(&self.biases, &self.weights, batch_size, learn_rate).map(|_| ())
    }

    /// Drops the accumulated gradient without touching the parameters.
    pub fn discard_gradient(&mut self) {
        self.gradient.reset();
    }

    pub fn is_finite(&self) -> bool {
        self.biases.iter().all(|b| b.is_finite()) && self.weights.all_finite()
    }

    #[cfg(test)]
    pub(crate) fn set_weight(&mut self, node: usize, input: usize, value: f64) {
        self.weights.row_mut(node)[input] = value;
    }
}
