pub use anyhow::{ensure, Result};
pub use num_traits::{Float, Num};
#[cfg(feature = "serde")]
pub use serde::{Deserialize, Serialize};
pub use std::ops::Mul;
