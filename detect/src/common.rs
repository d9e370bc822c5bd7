pub use anyhow::{ensure, format_err, Context as _, Error, Result};
pub use itertools::Itertools as _;
pub use log::info;
pub use once_cell::sync::Lazy;
pub use semver::{Version, VersionReq};
pub use serde::{de::Error as DeserializeError, Deserialize, Deserializer, Serialize};
pub use std::{
    fs,
    io::{self, Write as _},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Instant,
};
pub use tch::{Device, Kind, Tensor};
pub use usv_yolo::{Detection, Detector};
