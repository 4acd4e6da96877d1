pub mod network;
pub mod persist;
pub mod spec;

pub use network::{Network, ShapePolicy};
pub use persist::normalize_path;
pub use spec::NetworkSpec;
