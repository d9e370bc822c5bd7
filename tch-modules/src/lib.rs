//! Building blocks of the detector network.

mod common;

pub mod block;
pub mod bottleneck;
pub mod c3k;
pub mod c3k2;
pub mod conv_block;
pub mod detect_head;
pub mod prediction;
pub mod sppf;

pub use block::*;
pub use bottleneck::*;
pub use c3k::*;
pub use c3k2::*;
pub use conv_block::*;
pub use detect_head::*;
pub use prediction::*;
pub use sppf::*;
