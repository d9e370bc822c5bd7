pub use anyhow::{ensure, format_err, Error, Result};
pub use bbox::WH;
pub use getset::{CopyGetters, Getters};
pub use itertools::{izip, Itertools as _};
pub use log::debug;
pub use noisy_float::prelude::*;
pub use std::{borrow::Borrow, ops::Range};
pub use strum::AsRefStr;
pub use tch::{
    nn::{self, Module as _, ModuleT as _},
    Device, IndexOp, Tensor,
};
pub use tch_act::{Activation, TensorActivationExt as _};
pub use tch_tensor_like::TensorLike;
