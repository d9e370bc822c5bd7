use crate::common::*;
use model_config::PostprocessConfig;

pub use input::*;
pub use model::*;

pub static CONFIG_VERSION: Lazy<VersionReq> = Lazy::new(|| VersionReq::parse("0.1.0").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_version")]
    pub version: Version,
    pub model: ModelConfig,
    #[serde(default)]
    pub postprocess: PostprocessConfig,
    pub input: InputConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config: Self = json5::from_str(&text)?;
        config.postprocess.validate()?;
        Ok(config)
    }
}

mod model {
    use super::*;

    /// Model configuration.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ModelConfig {
        /// The architecture file.
        pub cfg_file: PathBuf,
        /// The device where the model runs on.
        #[serde(with = "tch_serde::serde_device")]
        pub device: Device,
    }
}

mod input {
    use super::*;

    /// Input options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct InputConfig {
        pub batch_size: NonZeroUsize,
        /// Optional class names indexed by class id.
        pub class_names: Option<Vec<String>>,
        pub kind: InputKind,
    }

    /// Source of input images.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum InputKind {
        /// Image files matching a glob pattern, resized to the configured image size.
        Images { pattern: String },
        /// Uniform random batches, useful for smoke tests and timing.
        Random { num_batches: NonZeroUsize },
    }
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let version = Version::parse(&text).map_err(|err| {
        D::Error::custom(format!(
            "failed to parse version number '{}': {:?}",
            text, err
        ))
    })?;

    if !CONFIG_VERSION.matches(&version) {
        return Err(D::Error::custom(format!(
            "incompatible version: get '{}', but it is incompatible with requirement '{}'",
            version, &*CONFIG_VERSION,
        )));
    }

    Ok(version)
}
