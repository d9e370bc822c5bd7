use anyhow::Result;
use detect::config::{Config, InputConfig, InputKind, ModelConfig, CONFIG_VERSION};
use lazy_static::lazy_static;
use model_config::PostprocessConfig;
use semver::Version;
use std::{num::NonZeroUsize, path::Path};
use tch::Device;

lazy_static! {
    static ref CRATE_DIR: &'static Path = Path::new(env!("CARGO_MANIFEST_DIR"));
}

#[test]
fn open_sample_config() -> Result<()> {
    let config = Config::open(CRATE_DIR.join("detect.json5"))?;
    assert!(CONFIG_VERSION.matches(&config.version));
    assert_eq!(config.model.device, Device::Cpu);
    assert_eq!(config.input.batch_size.get(), 4);
    assert_eq!(config.input.class_names, Some(vec!["ship".to_string()]));
    assert!(matches!(config.input.kind, InputKind::Images { .. }));
    assert_eq!(config.postprocess, PostprocessConfig::default());
    Ok(())
}

#[test]
fn reject_incompatible_version() {
    let text = r#"{
        version: "0.2.0",
        model: { cfg_file: "model.json5", device: "cpu" },
        input: { batch_size: 1, kind: { type: "Random", num_batches: 1 } },
    }"#;
    assert!(json5::from_str::<Config>(text).is_err());
}

#[test]
fn run_on_random_batches() -> Result<()> {
    let config = Config {
        version: Version::new(0, 1, 0),
        model: ModelConfig {
            cfg_file: CRATE_DIR.join("tests/cfg/tiny.json5"),
            device: Device::Cpu,
        },
        postprocess: PostprocessConfig {
            image_size: 64,
            ..Default::default()
        },
        input: InputConfig {
            batch_size: NonZeroUsize::new(2).unwrap(),
            class_names: Some(vec!["ship".into()]),
            kind: InputKind::Random {
                num_batches: NonZeroUsize::new(2).unwrap(),
            },
        },
    };
    detect::start(&config)
}

#[test]
fn reject_wrong_class_names() {
    let config = Config {
        version: Version::new(0, 1, 0),
        model: ModelConfig {
            cfg_file: CRATE_DIR.join("tests/cfg/tiny.json5"),
            device: Device::Cpu,
        },
        postprocess: PostprocessConfig::default(),
        input: InputConfig {
            batch_size: NonZeroUsize::new(1).unwrap(),
            class_names: Some(vec!["ship".into(), "buoy".into()]),
            kind: InputKind::Random {
                num_batches: NonZeroUsize::new(1).unwrap(),
            },
        },
    };
    assert!(detect::start(&config).is_err());
}
