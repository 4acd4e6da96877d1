use crate::error::{NetError, Result};
use crate::math::matrix::Matrix;

/// Running sums of per-sample gradient contributions for one layer.
///
/// Shapes always mirror the owning layer's biases and weights. Contributions
/// only ever add up through `accumulate`; the sole way to consume them is
/// `apply_and_reset`, which leaves every entry at exactly zero.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientAccumulator {
    biases: Vec<f64>,
    weights: Matrix,
}

impl GradientAccumulator {
    pub fn new(size: usize, input_size: usize) -> GradientAccumulator {
        GradientAccumulator {
            biases: vec![0.0; size],
            weights: Matrix::zeros(size, input_size),
        }
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Adds one sample's contribution. `deltas` are the node errors after the
    /// activation derivative has been applied, `inputs` the values that fed
    /// the layer for that sample.
    pub fn accumulate(&mut self, deltas: &[f64], inputs: &[f64]) {
        debug_assert_eq!(deltas.len(), self.biases.len());
        debug_assert_eq!(inputs.len(), self.weights.cols);

        for (n, &delta) in deltas.iter().enumerate() {
            self.biases[n] += delta;
            for (g, &input) in self.weights.row_mut(n).iter_mut().zip(inputs) {
                *g += input * delta;
            }
        }
    }

    /// Checks that stepping `biases` and `weights` by the batch-averaged
    /// gradient keeps every parameter finite, and returns the step scale.
    /// Nothing is modified.
    pub fn check_step(&self, biases: &[f64], weights: &Matrix, batch_size: usize, learn_rate: f64) -> Result<f64> {
        if batch_size == 0 {
            return Err(NetError::InvalidArgument("batch size must be at least 1".into()));
        }
        if !learn_rate.is_finite() {
            return Err(NetError::InvalidArgument(format!("learn rate {learn_rate} is not finite")));
        }
        let scale = learn_rate / batch_size as f64;

        let bias_steps = biases.iter().zip(&self.biases);
        let weight_steps = weights.iter_rows().flatten().zip(self.weights.iter_rows().flatten());
        if let Some((value, g)) = bias_steps.chain(weight_steps).find(|(v, g)| !(**v - **g * scale).is_finite()) {
            return Err(NetError::InvalidArgument(format!(
                "gradient step would leave a non-finite parameter ({value} - {g} * {scale})"
            )));
        }
        Ok(scale)
    }

    /// Steps `biases` and `weights` against the batch-averaged gradient, then
    /// zeroes the accumulator. A step that would produce a non-finite
    /// parameter is refused and leaves both the parameters and the
    /// accumulator untouched.
    pub fn apply_and_reset(
        &mut self,
        biases: &mut [f64],
        weights: &mut Matrix,
        batch_size: usize,
        learn_rate: f64,
    ) -> Result<()> {
        let scale = self.check_step(biases, weights, batch_size, learn_rate)?;

        for (b, g) in biases.iter_mut().zip(&self.biases) {
            *b -= g * scale;
        }
        for n in 0..self.weights.rows {
            for (w, g) in weights.row_mut(n).iter_mut().zip(self.weights.row(n)) {
                *w -= g * scale;
            }
        }

        self.reset();
        Ok(())
    }

    /// Discards everything accumulated so far.
    pub fn reset(&mut self) {
        self.biases.iter_mut().for_each(|g| *g = 0.0);
        self.weights.fill(0.0);
    }

    pub fn resize_cols(&mut self, new_cols: usize) {
        self.weights.resize_cols(new_cols);
    }

    pub fn is_zero(&self) -> bool {
        self.biases.iter().all(|&g| g == 0.0) && self.weights.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_additively_and_averages_on_apply() {
        let mut acc = GradientAccumulator::new(1, 2);
        acc.accumulate(&[1.0], &[1.0, 2.0]);
        acc.accumulate(&[3.0], &[1.0, 0.0]);
        assert_eq!(acc.biases(), &[4.0]);
        assert_eq!(acc.weights().row(0), &[4.0, 2.0]);

        let mut biases = vec![0.0];
        let mut weights = Matrix::zeros(1, 2);
        acc.apply_and_reset(&mut biases, &mut weights, 2, 0.5).unwrap();
        assert_eq!(biases, vec![-1.0]);
        assert_eq!(weights.row(0), &[-1.0, -0.5]);
        assert!(acc.is_zero());
    }

    #[test]
    fn zero_batch_is_rejected_and_leaves_state_alone() {
        let mut acc = GradientAccumulator::new(1, 1);
        acc.accumulate(&[1.0], &[1.0]);
        let mut biases = vec![0.0];
        let mut weights = Matrix::zeros(1, 1);
        let err = acc.apply_and_reset(&mut biases, &mut weights, 0, 1.0).unwrap_err();
        assert!(matches!(err, NetError::InvalidArgument(_)));
        assert!(!acc.is_zero());
        assert_eq!(biases, vec![0.0]);
    }

    #[test]
    fn non_finite_step_is_refused_without_side_effects() {
        let mut acc = GradientAccumulator::new(1, 2);
        acc.accumulate(&[-2.0], &[f64::MAX, f64::MAX]);
        acc.accumulate(&[-2.0], &[f64::MAX, 1.0]);
        let mut biases = vec![0.0];
        let mut weights = Matrix::from_rows(vec![vec![1.0, -1.0]]).unwrap();

        let err = acc.apply_and_reset(&mut biases, &mut weights, 2, 1.0).unwrap_err();
        assert!(matches!(err, NetError::InvalidArgument(_)));
        assert_eq!(weights.row(0), &[1.0, -1.0]);
        assert_eq!(biases, vec![0.0]);
        assert!(!acc.is_zero());

        acc.reset();
        assert!(acc.is_zero());
    }
}
