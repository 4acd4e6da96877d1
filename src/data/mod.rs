pub mod data_point;
pub mod dataset;

pub use data_point::DataPoint;
pub use dataset::{read_csv, write_csv};
