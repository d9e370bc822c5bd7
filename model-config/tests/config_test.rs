use anyhow::Result;
use model_config::{AnchorSize, ModelConfig};
use std::path::{Path, PathBuf};

lazy_static::lazy_static! {
    static ref CONFIG_DIR: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("cfg");
}

#[test]
fn model_config_test() -> Result<()> {
    let config = ModelConfig::load(CONFIG_DIR.join("usv-ship.json5"))?;
    assert_eq!(config, ModelConfig::with_num_classes(1));
    assert_eq!(config.num_outputs(), 6);
    Ok(())
}

#[test]
fn head_channel_mismatch_test() {
    let result = ModelConfig::load(CONFIG_DIR.join("head-channel-mismatch.json5"));
    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("input channels"));
}

#[test]
fn flat_anchors_test() -> Result<()> {
    let config = ModelConfig::load(CONFIG_DIR.join("flat-anchors.json5"))?;
    assert_eq!(config, ModelConfig::with_num_classes(1));
    assert_eq!(config.detection_layers[0].anchors, AnchorSize::default_anchors()[..3]);
    Ok(())
}
