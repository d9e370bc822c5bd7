use crate::common::*;

/// Anchors of the reference model, grouped three per detection layer.
pub const DEFAULT_ANCHORS: [(f64, f64); 9] = [
    (10.0, 13.0),
    (16.0, 30.0),
    (33.0, 23.0),
    (30.0, 61.0),
    (62.0, 45.0),
    (59.0, 119.0),
    (116.0, 90.0),
    (156.0, 198.0),
    (373.0, 326.0),
];

/// Declared strides of the three detection layers.
pub const DEFAULT_STRIDES: [usize; 3] = [8, 16, 32];

pub use anchor_size::*;
mod anchor_size {
    use super::*;

    /// Anchor size in pixels at the model's reference input resolution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(try_from = "(R64, R64)", into = "(R64, R64)")]
    pub struct AnchorSize {
        pub w: R64,
        pub h: R64,
    }

    impl AnchorSize {
        pub fn new(w: f64, h: f64) -> Result<Self> {
            ensure!(
                w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0,
                "anchor size must be positive, but get {}x{}",
                w,
                h
            );
            Ok(Self {
                w: r64(w),
                h: r64(h),
            })
        }

        /// The reference anchors of all detection layers, in layer order.
        pub fn default_anchors() -> Vec<Self> {
            DEFAULT_ANCHORS
                .iter()
                .map(|&(w, h)| Self {
                    w: r64(w),
                    h: r64(h),
                })
                .collect()
        }

        /// The anchor size relative to the reference input resolution.
        pub fn to_ratio(&self, reference_size: usize) -> WH<f64> {
            WH::from_wh([self.w.raw(), self.h.raw()]).normalize(reference_size as f64)
        }
    }

    impl TryFrom<(R64, R64)> for AnchorSize {
        type Error = anyhow::Error;

        fn try_from((w, h): (R64, R64)) -> Result<Self, Self::Error> {
            Self::new(w.raw(), h.raw())
        }
    }

    impl From<AnchorSize> for (R64, R64) {
        fn from(AnchorSize { w, h }: AnchorSize) -> Self {
            (w, h)
        }
    }
}

pub use detection_layer::*;
mod detection_layer {
    use super::*;

    /// Anchors, stride and input width of one detection layer.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DetectionLayerConfig {
        pub stride: usize,
        pub anchors: Vec<AnchorSize>,
        pub in_c: usize,
    }

    impl DetectionLayerConfig {
        /// Splits a flat anchor list evenly across the layers described by
        /// `strides` and `in_cs`, in order.
        pub fn group(anchors: &[AnchorSize], strides: &[usize], in_cs: &[usize]) -> Result<Vec<Self>> {
            let num_layers = strides.len();
            ensure!(num_layers > 0, "at least one detection layer is required");
            ensure!(
                in_cs.len() == num_layers,
                "expect {} input channel counts, but get {}",
                num_layers,
                in_cs.len()
            );
            ensure!(
                !anchors.is_empty() && anchors.len() % num_layers == 0,
                "{} anchors cannot be divided evenly across {} detection layers",
                anchors.len(),
                num_layers
            );

            let anchors_per_layer = anchors.len() / num_layers;
            let layers = izip!(anchors.chunks(anchors_per_layer), strides, in_cs)
                .map(|(anchors, &stride, &in_c)| Self {
                    stride,
                    anchors: anchors.to_vec(),
                    in_c,
                })
                .collect();
            Ok(layers)
        }

        /// The reference layers for the given backbone output widths.
        pub fn default_layers(in_cs: [usize; 3]) -> Vec<Self> {
            let anchors = AnchorSize::default_anchors();
            izip!(anchors.chunks(3), DEFAULT_STRIDES, in_cs)
                .map(|(anchors, stride, in_c)| Self {
                    stride,
                    anchors: anchors.to_vec(),
                    in_c,
                })
                .collect()
        }

        pub fn num_anchors(&self) -> usize {
            self.anchors.len()
        }

        /// Output channels of the 1x1 projection of this layer.
        pub fn num_outputs(&self, num_classes: usize) -> usize {
            self.anchors.len() * (num_classes + 5)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_default_anchors() -> Result<()> {
        let layers = DetectionLayerConfig::default_layers([128, 256, 512]);
        assert_eq!(layers.len(), 3);
        assert!(layers.iter().all(|layer| layer.num_anchors() == 3));
        assert_eq!(layers[1].anchors[2], AnchorSize::new(59.0, 119.0)?);
        assert_eq!(layers[2].stride, 32);
        assert_eq!(layers[2].in_c, 512);
        assert_eq!(layers[0].num_outputs(1), 18);
        Ok(())
    }

    #[test]
    fn group_flat_anchors() -> Result<()> {
        let anchors = AnchorSize::default_anchors();
        let layers = DetectionLayerConfig::group(&anchors, &DEFAULT_STRIDES, &[128, 256, 512])?;
        assert_eq!(layers, DetectionLayerConfig::default_layers([128, 256, 512]));

        let strides: Vec<_> = layers.iter().map(|layer| layer.stride).collect();
        let in_cs: Vec<_> = layers.iter().map(|layer| layer.in_c).collect();
        assert_eq!(strides, vec![8, 16, 32]);
        assert_eq!(in_cs, vec![128, 256, 512]);
        assert_eq!(layers[0].anchors, anchors[0..3].to_vec());
        assert_eq!(layers[1].anchors, anchors[3..6].to_vec());
        assert_eq!(layers[2].anchors, anchors[6..9].to_vec());
        assert_eq!(layers[2].anchors[0], AnchorSize::new(116.0, 90.0)?);
        Ok(())
    }

    #[test]
    fn reject_uneven_anchors() -> Result<()> {
        let anchors = vec![AnchorSize::new(10.0, 13.0)?; 8];
        let result = DetectionLayerConfig::group(&anchors, &[8, 16, 32], &[128, 256, 512]);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn reject_bad_anchor_size() {
        assert!(AnchorSize::new(0.0, 13.0).is_err());
        assert!(serde_json::from_str::<AnchorSize>("[-1.0, 2.0]").is_err());
    }

    #[test]
    fn anchor_serde() -> Result<()> {
        let anchor: AnchorSize = serde_json::from_str("[116.0, 90.0]")?;
        assert_eq!(anchor, AnchorSize::new(116.0, 90.0)?);
        let ratio = anchor.to_ratio(640);
        assert!((ratio.w() - 116.0 / 640.0).abs() < 1e-12);
        Ok(())
    }
}
