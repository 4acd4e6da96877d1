pub struct MseLoss;

impl MseLoss {
    /// Squared error of a single output node.
    pub fn value(predicted: f64, expected: f64) -> f64 {
        (predicted - expected).powi(2)
    }

    /// d/dp (p - y)²
    pub fn slope(predicted: f64, expected: f64) -> f64 {
        2.0 * (predicted - expected)
    }

    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(&a, &b)| MseLoss::value(a, b))
            .sum::<f64>() / n
    }

    /// Per-output gradient: 2·(predicted - expected)
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(&a, &b)| MseLoss::slope(a, b))
            .collect()
    }
}
