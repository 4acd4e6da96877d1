use rand::Rng;
use tracing::{debug, warn};

use crate::activation::activation::ActivationFunction;
use crate::data::data_point::DataPoint;
use crate::error::{NetError, Result};
use crate::layers::dense::Layer;
use crate::layers::init::InitRange;
use crate::loss::mse::MseLoss;
use crate::math::vector::argmax;
use crate::train::report::LearnReport;

/// How a forward pass treats an input whose width disagrees with the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapePolicy {
    /// Reject mismatched widths with `ShapeMismatch`.
    #[default]
    Strict,
    /// Resize layers to fit the incoming data. This permanently changes the
    /// network's shape; meant for adapting a loaded network to a new dataset.
    Adjust,
}

#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Builds a freshly initialized network. `layer_sizes` lists node counts
    /// from the first hidden layer to the output layer.
    pub fn new(input_size: usize, layer_sizes: &[usize], init: &InitRange) -> Result<Network> {
        Network::with_rng(input_size, layer_sizes, init, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        input_size: usize,
        layer_sizes: &[usize],
        init: &InitRange,
        rng: &mut R,
    ) -> Result<Network> {
        if layer_sizes.is_empty() {
            return Err(NetError::InvalidArgument("network needs at least one layer".into()));
        }
        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut fan_in = input_size;
        for &size in layer_sizes {
            layers.push(Layer::new(size, fan_in, init, rng)?);
            fan_in = size;
        }
        Ok(Network { layers })
    }

    /// Wraps existing layers, checking that each one reads exactly as many
    /// inputs as its predecessor has nodes.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Network> {
        if layers.is_empty() {
            return Err(NetError::InvalidArgument("network needs at least one layer".into()));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[1].input_size() != pair[0].size() {
                return Err(NetError::shape(format!("layer {} input", i + 1), pair[0].size(), pair[1].input_size()));
            }
        }
        Ok(Network { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Node count of every layer, input side first.
    pub fn shape(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.size()).collect()
    }

    /// Total number of trainable scalars.
    pub fn size(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_count()).sum()
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].size()
    }

    /// Explicit structural change of the first layer's input width.
    pub fn resize_input_width(&mut self, new_width: usize) -> Result<()> {
        self.layers[0].resize_input_width(new_width)
    }

    /// Runs `dp`'s inputs through every layer. Under `Strict` both the input
    /// and the target width are checked first.
    pub fn calculate(&mut self, dp: &DataPoint, activation: ActivationFunction, policy: ShapePolicy) -> Result<Vec<f64>> {
        if policy == ShapePolicy::Strict {
            self.check_point(dp, dp.values().len())?;
        }
        self.forward(dp.values(), activation, policy)
    }

    /// Inference on a bare input vector.
    pub fn calculate_inputs(&mut self, inputs: &[f64], activation: ActivationFunction, policy: ShapePolicy) -> Result<Vec<f64>> {
        if policy == ShapePolicy::Strict && inputs.len() != self.input_size() {
            return Err(NetError::shape("network input", self.input_size(), inputs.len()));
        }
        self.forward(inputs, activation, policy)
    }

    fn forward(&mut self, inputs: &[f64], activation: ActivationFunction, policy: ShapePolicy) -> Result<Vec<f64>> {
        let mut current = inputs.to_vec();
        for layer in &mut self.layers {
            current = match policy {
                ShapePolicy::Strict => layer.calculate(&current, activation)?,
                ShapePolicy::Adjust => layer.calculate_adjusting(&current, activation)?,
            };
        }
        Ok(current)
    }

    fn check_point(&self, dp: &DataPoint, input_width: usize) -> Result<()> {
        if dp.values().len() != input_width {
            return Err(NetError::shape("network input", input_width, dp.values().len()));
        }
        if dp.y().len() != self.output_size() {
            return Err(NetError::shape("network output", self.output_size(), dp.y().len()));
        }
        Ok(())
    }

    /// One gradient-descent step over `data`, treated as a single mini-batch.
    ///
    /// Every point is run forward, its MSE gradient is propagated back through
    /// all layers into their accumulators, and once the whole batch is done
    /// each layer applies the batch-averaged gradient exactly once.
    ///
    /// All points are shape-checked before any gradient is accumulated. Under
    /// `Adjust` the batch must share one input width; the first layer is
    /// resized to it once, up front. This is stricter than adjusting per
    /// sample: a batch mixing input widths is rejected rather than resizing
    /// the layer between points. Targets must always match the output width.
    ///
    /// If the averaged step would leave any parameter non-finite, the whole
    /// batch is discarded, no layer changes, and `InvalidArgument` is returned.
    pub fn learn(
        &mut self,
        data: &[DataPoint],
        activation: ActivationFunction,
        learn_rate: f64,
        policy: ShapePolicy,
    ) -> Result<LearnReport> {
        if data.is_empty() {
            return Err(NetError::InvalidArgument("cannot learn from an empty batch".into()));
        }
        if !learn_rate.is_finite() {
            return Err(NetError::InvalidArgument(format!("learn rate {learn_rate} is not finite")));
        }

        let input_width = match policy {
            ShapePolicy::Strict => self.input_size(),
            ShapePolicy::Adjust => data[0].values().len(),
        };
        for dp in data {
            self.check_point(dp, input_width)?;
        }
        if policy == ShapePolicy::Adjust {
            self.resize_input_width(input_width)?;
        }

        let outputs = self.output_size();
        let mut report = LearnReport::empty(outputs);
        let mut total_cost = 0.0;

        for dp in data {
            let predicted = self.forward(dp.values(), activation, ShapePolicy::Strict)?;
            total_cost += MseLoss::loss(&predicted, dp.y());

            let mut errors = MseLoss::derivative(&predicted, dp.y());
            for i in (0..self.layers.len()).rev() {
                let (upstream, rest) = self.layers.split_at_mut(i);
                let backward_outputs = match upstream.last() {
                    Some(prev) => prev.activated_outputs(),
                    None => dp.values(),
                };
                errors = rest[0].update_gradient(activation, &errors, backward_outputs)?;
            }

            report.record(dp.label(), argmax(&predicted));
        }

        // Either every layer steps or none does.
        if let Err(e) = self.layers.iter().try_for_each(|l| l.check_gradient_step(data.len(), learn_rate)) {
            self.layers.iter_mut().for_each(|l| l.discard_gradient());
            warn!(batch = data.len(), learn_rate, "discarded mini-batch: {e}");
            return Err(e);
        }
        for layer in &mut self.layers {
            layer.apply_gradient(data.len(), learn_rate)?;
        }

        report.finish(total_cost, data.len());
        debug!(
            batch = data.len(),
            cost = report.avg_cost,
            accuracy = report.accuracy,
            "applied mini-batch"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn point(values: &[f64], y: &[f64]) -> DataPoint {
        DataPoint::new(values.to_vec(), y.to_vec()).unwrap()
    }

    fn seeded(input: usize, sizes: &[usize]) -> Network {
        let mut rng = StdRng::seed_from_u64(42);
        Network::with_rng(input, sizes, &InitRange::default(), &mut rng).unwrap()
    }

    fn single(biases: Vec<f64>, weights: Vec<Vec<f64>>) -> Network {
        let layer = Layer::from_parts(biases, Matrix::from_rows(weights).unwrap()).unwrap();
        Network::from_layers(vec![layer]).unwrap()
    }

    #[test]
    fn derived_shape_and_size() {
        let net = seeded(3, &[4, 2]);
        assert_eq!(net.shape(), vec![4, 2]);
        assert_eq!(net.input_size(), 3);
        assert_eq!(net.output_size(), 2);
        assert_eq!(net.size(), (4 + 4 * 3) + (2 + 2 * 4));
    }

    #[test]
    fn construction_rejects_bad_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Network::with_rng(2, &[], &InitRange::default(), &mut rng).is_err());
        assert!(Network::with_rng(2, &[3, 0], &InitRange::default(), &mut rng).is_err());

        let a = Layer::from_parts(vec![0.0; 2], Matrix::zeros(2, 3)).unwrap();
        let b = Layer::from_parts(vec![0.0], Matrix::zeros(1, 3)).unwrap();
        let err = Network::from_layers(vec![a, b]).unwrap_err();
        assert!(matches!(err, NetError::ShapeMismatch { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn step_network_end_to_end() {
        let mut net = single(vec![0.0], vec![vec![1.0, 1.0]]);
        let out = net.calculate(&point(&[0.6, 0.6], &[1.0]), ActivationFunction::Step, ShapePolicy::Strict).unwrap();
        assert_eq!(out, vec![1.0]);
        assert!((net.layers()[0].raw_outputs()[0] - 1.2).abs() < 1e-12);
    }

    #[test]
    fn strict_calculate_checks_both_ends() {
        let mut net = seeded(2, &[3, 2]);
        let f = ActivationFunction::Sigmoid;
        let err = net.calculate(&point(&[1.0], &[1.0, 0.0]), f, ShapePolicy::Strict).unwrap_err();
        assert!(matches!(err, NetError::ShapeMismatch { expected: 2, actual: 1, .. }));
        let err = net.calculate(&point(&[1.0, 1.0], &[1.0]), f, ShapePolicy::Strict).unwrap_err();
        assert!(matches!(err, NetError::ShapeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn adjust_policy_resizes_the_first_layer() {
        let mut net = seeded(3, &[2, 1]);
        let out = net.calculate(&point(&[0.1; 5], &[1.0]), ActivationFunction::Tanh, ShapePolicy::Adjust).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(net.input_size(), 5);
        assert_eq!(net.layers()[0].weights().column(4), vec![0.0, 0.0]);
        assert_eq!(net.shape(), vec![2, 1]);
    }

    #[test]
    fn initial_error_is_the_mse_derivative() {
        // Zero weights and biases make every sigmoid output exactly 0.5.
        let mut net = single(vec![0.0, 0.0], vec![vec![0.0], vec![0.0]]);
        let dp = point(&[1.0], &[1.0, 0.0]);
        let predicted = net.calculate(&dp, ActivationFunction::Sigmoid, ShapePolicy::Strict).unwrap();
        assert_eq!(predicted, vec![0.5, 0.5]);
        assert_eq!(MseLoss::derivative(&predicted, dp.y()), vec![-1.0, 1.0]);

        let report = net.learn(&[dp], ActivationFunction::Sigmoid, 1.0, ShapePolicy::Strict).unwrap();
        // delta = [-1, 1] * sigmoid'(0) = [-0.25, 0.25]; input 1, batch 1.
        assert_eq!(net.layers()[0].biases(), &[0.25, -0.25]);
        assert_eq!(net.layers()[0].weights().column(0), vec![0.25, -0.25]);
        assert_eq!(report.avg_cost, 0.25);
        assert_eq!(report.expected_distribution, vec![1, 0]);
        assert_eq!(report.chosen_distribution, vec![1, 0]);
        assert_eq!(report.correct_distribution, vec![1, 0]);
        assert_eq!(report.accuracy, 1.0);
    }

    #[test]
    fn backprop_matches_numeric_gradient() {
        let f = ActivationFunction::Sigmoid;
        let mut net = seeded(2, &[3, 2]);
        let dp = point(&[0.3, -0.8], &[0.0, 1.0]);

        let cost = |n: &mut Network| {
            let out = n.calculate(&dp, f, ShapePolicy::Strict).unwrap();
            MseLoss::loss(&out, dp.y()) * out.len() as f64
        };

        // With batch 1 and learn rate 1 the step equals the gradient.
        let before = net.clone();
        net.learn(std::slice::from_ref(&dp), f, 1.0, ShapePolicy::Strict).unwrap();

        let h = 1e-6;
        for l in 0..2 {
            let layer_before = &before.layers()[l];
            for n in 0..layer_before.size() {
                let analytic = layer_before.biases()[n] - net.layers()[l].biases()[n];
                let mut plus = before.clone();
                let mut minus = before.clone();
                plus.layers[l] = nudge_bias(&plus.layers[l], n, h);
                minus.layers[l] = nudge_bias(&minus.layers[l], n, -h);
                let numeric = (cost(&mut plus) - cost(&mut minus)) / (2.0 * h);
                assert!((numeric - analytic).abs() < 1e-6, "layer {l} node {n}: {numeric} vs {analytic}");
            }
        }
    }

    fn nudge_bias(layer: &Layer, n: usize, h: f64) -> Layer {
        let mut biases = layer.biases().to_vec();
        biases[n] += h;
        Layer::from_parts(biases, layer.weights().clone()).unwrap()
    }

    #[test]
    fn distributions_sum_to_batch_size() {
        let mut net = seeded(2, &[3, 3]);
        let data: Vec<DataPoint> = (0..7)
            .map(|i| {
                let mut y = vec![0.0; 3];
                y[i % 3] = 1.0;
                point(&[i as f64 * 0.1, 1.0 - i as f64 * 0.1], &y)
            })
            .collect();
        let report = net.learn(&data, ActivationFunction::Sigmoid, 0.5, ShapePolicy::Strict).unwrap();

        assert_eq!(report.expected_distribution.iter().sum::<usize>(), 7);
        assert_eq!(report.chosen_distribution.iter().sum::<usize>(), 7);
        assert!(report.correct_distribution.iter().sum::<usize>() <= 7);
        assert_eq!(report.expected_distribution, vec![3, 2, 2]);
        assert_eq!(report.batch_size(), 7);
        assert!(net.layers().iter().all(|l| l.gradient().is_zero()));
    }

    #[test]
    fn learn_rejects_empty_batch_and_bad_points_without_accumulating() {
        let mut net = seeded(2, &[2]);
        let f = ActivationFunction::Sigmoid;
        assert!(matches!(net.learn(&[], f, 1.0, ShapePolicy::Strict), Err(NetError::InvalidArgument(_))));

        let data = vec![point(&[1.0, 0.0], &[1.0, 0.0]), point(&[1.0], &[1.0, 0.0])];
        let before = net.layers()[0].weights().clone();
        assert!(net.learn(&data, f, 1.0, ShapePolicy::Strict).is_err());
        assert_eq!(net.layers()[0].weights(), &before);
        assert!(net.layers()[0].gradient().is_zero());
    }

    #[test]
    fn adjusting_learn_resizes_once_for_the_batch() {
        let mut net = seeded(2, &[2]);
        let data = vec![point(&[1.0, 0.0, 0.5], &[1.0, 0.0]), point(&[0.0, 1.0, 0.5], &[0.0, 1.0])];
        net.learn(&data, ActivationFunction::Tanh, 0.1, ShapePolicy::Adjust).unwrap();
        assert_eq!(net.input_size(), 3);

        let mixed = vec![point(&[1.0], &[1.0, 0.0]), point(&[1.0, 1.0], &[1.0, 0.0])];
        assert!(net.learn(&mixed, ActivationFunction::Tanh, 0.1, ShapePolicy::Adjust).is_err());
        assert_eq!(net.input_size(), 3);
    }

    #[test]
    fn diverging_batch_changes_no_layer() {
        let layer = Layer::from_parts(vec![0.0], Matrix::from_rows(vec![vec![1.0, -1.0]]).unwrap()).unwrap();
        let mut net = Network::from_layers(vec![layer]).unwrap();
        let data = vec![point(&[f64::MAX, -f64::MAX], &[1.0]), point(&[f64::MAX, f64::MAX], &[1.0])];

        let err = net.learn(&data, ActivationFunction::Tanh, 1.0, ShapePolicy::Strict).unwrap_err();
        assert!(matches!(err, NetError::InvalidArgument(_)));
        assert_eq!(net.layers()[0].weights().row(0), &[1.0, -1.0]);
        assert!(net.layers()[0].gradient().is_zero());
    }
}
