use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::activation::activation::ActivationFunction;
use crate::error::{NetError, Result};
use crate::layers::init::InitRange;
use crate::network::network::{Network, ShapePolicy};

/// A serializable description of a network and how it is trained.
///
/// The spec lives next to a saved model folder so a network can be rebuilt
/// or reloaded with the activation and learn rate it was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, used for logging only.
    pub name: String,
    /// Width of each input vector.
    pub input_size: usize,
    /// Node count per layer, first hidden layer to output layer.
    pub layer_sizes: Vec<usize>,
    pub activation: ActivationFunction,
    /// Range fresh weights are drawn from; defaults to [-1, 1).
    #[serde(default)]
    pub init: InitRange,
    pub learn_rate: f64,
}

impl NetworkSpec {
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 || self.layer_sizes.is_empty() || self.layer_sizes.contains(&0) {
            return Err(NetError::InvalidArgument(format!(
                "spec '{}' needs a non-zero input size and non-empty layers",
                self.name
            )));
        }
        if !self.learn_rate.is_finite() || self.learn_rate <= 0.0 {
            return Err(NetError::InvalidArgument(format!(
                "spec '{}' has learn rate {}, expected a positive number",
                self.name, self.learn_rate
            )));
        }
        self.init.validate()
    }

    pub fn build(&self) -> Result<Network> {
        self.build_with_rng(&mut rand::thread_rng())
    }

    pub fn build_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        self.validate()?;
        Network::with_rng(self.input_size, &self.layer_sizes, &self.init, rng)
    }

    /// Checks that a loaded network has the shape this spec describes. Node
    /// counts must always agree. Under `Adjust` a differing input width is
    /// only logged, since the network will be resized to the data anyway.
    pub fn check_matches(&self, network: &Network, policy: ShapePolicy) -> Result<()> {
        let shape = network.shape();
        if shape != self.layer_sizes {
            return Err(NetError::MalformedRecord(format!(
                "spec '{}' describes layers {:?} but the model has {:?}",
                self.name, self.layer_sizes, shape
            )));
        }
        if network.input_size() != self.input_size {
            if policy == ShapePolicy::Strict {
                return Err(NetError::shape(
                    format!("spec '{}' input", self.name),
                    self.input_size,
                    network.input_size(),
                ));
            }
            warn!(spec = self.input_size, model = network.input_size(), "model input width differs from spec");
        }
        Ok(())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let spec: NetworkSpec = serde_json::from_reader(reader)?;
        spec.validate()?;
        Ok(spec)
    }
}
