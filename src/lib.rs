pub mod error;
pub mod math;
pub mod activation;
pub mod loss;
pub mod data;
pub mod layers;
pub mod network;
pub mod train;

// Convenience re-exports
pub use error::{NetError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::{ActivationFunction, Mode};
pub use data::data_point::DataPoint;
pub use layers::dense::Layer;
pub use layers::gradient::GradientAccumulator;
pub use layers::init::InitRange;
pub use network::network::{Network, ShapePolicy};
pub use network::spec::NetworkSpec;
pub use loss::mse::MseLoss;
pub use train::report::LearnReport;
