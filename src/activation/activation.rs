use serde::{Deserialize, Serialize};
use std::f64::consts::E;

/// Selects whether an activation is evaluated for its value or its slope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Value,
    Derivative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    /// Binary step: 0 below zero, 1 otherwise. Its derivative is taken as 0
    /// everywhere, so a step network does not learn through backprop.
    Step,
    Sigmoid,
    /// Sigmoid rescaled to (-1, 1).
    BipolarSigmoid,
    Tanh,
}

impl ActivationFunction {
    pub fn evaluate(&self, x: f64, mode: Mode) -> f64 {
        match mode {
            Mode::Value => self.function(x),
            Mode::Derivative => self.derivative(x),
        }
    }

    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Step => if x < 0.0 { 0.0 } else { 1.0 },
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::BipolarSigmoid => -1.0 + 2.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Derivative with respect to the pre-activation input `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Step => 0.0,
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::BipolarSigmoid => {
                let fx = self.function(x);
                0.5 * (1.0 + fx) * (1.0 - fx)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }
}
