#[cfg(feature = "tch")]
pub use impls::*;
#[cfg(feature = "tch")]
mod impls;

#[cfg(feature = "tch")]
pub use r#trait::*;
#[cfg(feature = "tch")]
mod r#trait;

/// Activation applied at the end of a convolution block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Activation {
    /// Sigmoid-weighted linear unit, also known as swish.
    Silu,
    Mish,
    HardSwish,
    Relu,
    LeakyRelu,
    Sigmoid,
    /// Passes the input through unchanged.
    Identity,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Silu
    }
}
