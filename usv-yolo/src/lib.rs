//! Single-stage anchor-based detector for small objects in maritime imagery.

mod common;
pub mod detection;
pub mod detector;
pub mod model;
pub mod postprocess;

pub use detection::*;
pub use detector::*;
pub use model::*;
pub use postprocess::*;
