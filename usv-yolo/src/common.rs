pub use anyhow::{ensure, format_err, Error, Result};
pub use bbox::{prelude::*, XYXY};
pub use derivative::Derivative;
pub use getset::CopyGetters;
pub use itertools::izip;
pub use log::{debug, info};
pub use model_config::{Activation, DecodeMode, ModelConfig, PostprocessConfig};
pub use noisy_float::prelude::*;
pub use rayon::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{borrow::Borrow, collections::BTreeMap};
pub use tch::{nn, Device, IndexOp, Kind, Tensor};
pub use tch_modules::{
    Block, C3k2Init, ConvBlockInit, DetectHeadInit, DetectLayerInit, GridSize, LayerInfo,
    RawPrediction, SppfInit,
};
pub use tch_tensor_like::TensorLike;
