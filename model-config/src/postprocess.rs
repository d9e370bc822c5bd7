use crate::common::*;

/// How box parameters are turned into image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Squashed box parameters are taken as normalized `(cx, cy, w, h)`.
    /// Anchors and grid positions are not consulted.
    Direct,
    /// Box centers are offsets from their grid cell and box sizes are
    /// scaled from the layer's anchors.
    Grid,
}

impl Default for DecodeMode {
    fn default() -> Self {
        Self::Direct
    }
}

/// Per-call options of decoding and non-maximum suppression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PostprocessConfig {
    /// Detections must score strictly above this value.
    pub confidence_threshold: R64,
    /// Same-class boxes overlapping a kept box by more than this IoU are suppressed.
    pub iou_threshold: R64,
    /// Side length in pixels that normalized coordinates are scaled to.
    pub image_size: usize,
    pub decode: DecodeMode,
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: r64(0.25),
            iou_threshold: r64(0.45),
            image_size: 640,
            decode: DecodeMode::Direct,
        }
    }
}

impl PostprocessConfig {
    pub fn validate(&self) -> Result<()> {
        let Self {
            confidence_threshold,
            iou_threshold,
            image_size,
            ..
        } = *self;

        ensure!(
            (0.0..=1.0).contains(&confidence_threshold.raw()),
            "confidence_threshold must be in range [0, 1], but get {}",
            confidence_threshold
        );
        ensure!(
            (0.0..=1.0).contains(&iou_threshold.raw()),
            "iou_threshold must be in range [0, 1], but get {}",
            iou_threshold
        );
        ensure!(image_size > 0, "image_size must be positive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postprocess_defaults() -> Result<()> {
        let config: PostprocessConfig = json5::from_str("{ decode: 'grid' }")?;
        assert_eq!(config.confidence_threshold, 0.25);
        assert_eq!(config.iou_threshold, 0.45);
        assert_eq!(config.image_size, 640);
        assert_eq!(config.decode, DecodeMode::Grid);
        config.validate()?;
        Ok(())
    }

    #[test]
    fn reject_out_of_range_threshold() {
        let config = PostprocessConfig {
            iou_threshold: r64(1.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
