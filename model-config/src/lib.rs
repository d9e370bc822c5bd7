//! Configuration types of the detector and its postprocessing.

mod common;
pub mod detection;
pub mod model;
pub mod postprocess;

pub use detection::*;
pub use model::*;
pub use postprocess::*;
pub use tch_act::Activation;
