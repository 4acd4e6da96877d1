pub mod dense;
pub mod gradient;
pub mod init;
mod table;

pub use dense::Layer;
pub use gradient::GradientAccumulator;
pub use init::InitRange;
