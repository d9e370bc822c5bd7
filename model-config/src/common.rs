pub use anyhow::{bail, ensure, Context as _, Result};
pub use bbox::WH;
pub use itertools::{izip, Itertools as _};
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{fs, path::Path};
pub use tch_act::Activation;
