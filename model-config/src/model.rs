use crate::{
    common::*,
    detection::{AnchorSize, DetectionLayerConfig, DEFAULT_STRIDES},
};

/// Architecture of the detector.
///
/// The backbone is built from `widths = [w0, w1, w2, w3, w4]` and exposes
/// three feature maps with `w2`, `w3` and `w4` channels to the detection
/// head.
///
/// Detection layers are either listed in `detection_layers`, or given as a
/// flat `anchors` list with optional `strides`, which is split evenly across
/// the layers. Omitted layers take the reference anchors and strides, and
/// their input channels always follow `widths`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "UncheckedModelConfig")]
pub struct ModelConfig {
    pub input_channels: usize,
    pub num_classes: usize,
    pub widths: [usize; 5],
    /// Number of residual bottlenecks inside each C3k block.
    pub c3k_repeat: usize,
    pub sppf_kernel: usize,
    pub activation: Activation,
    /// The input resolution that anchor sizes are expressed in.
    pub reference_size: usize,
    pub detection_layers: Vec<DetectionLayerConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let widths = [32, 64, 128, 256, 512];
        Self {
            input_channels: 3,
            num_classes: 80,
            widths,
            c3k_repeat: 2,
            sppf_kernel: 5,
            activation: Activation::Silu,
            reference_size: 640,
            detection_layers: DetectionLayerConfig::default_layers(feature_channels(widths)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UncheckedModelConfig {
    input_channels: usize,
    num_classes: usize,
    widths: [usize; 5],
    c3k_repeat: usize,
    sppf_kernel: usize,
    activation: Activation,
    reference_size: usize,
    detection_layers: Option<Vec<DetectionLayerConfig>>,
    anchors: Option<Vec<AnchorSize>>,
    strides: Option<Vec<usize>>,
}

impl Default for UncheckedModelConfig {
    fn default() -> Self {
        let ModelConfig {
            input_channels,
            num_classes,
            widths,
            c3k_repeat,
            sppf_kernel,
            activation,
            reference_size,
            ..
        } = ModelConfig::default();

        Self {
            input_channels,
            num_classes,
            widths,
            c3k_repeat,
            sppf_kernel,
            activation,
            reference_size,
            detection_layers: None,
            anchors: None,
            strides: None,
        }
    }
}

impl TryFrom<UncheckedModelConfig> for ModelConfig {
    type Error = anyhow::Error;

    fn try_from(from: UncheckedModelConfig) -> Result<Self, Self::Error> {
        let UncheckedModelConfig {
            input_channels,
            num_classes,
            widths,
            c3k_repeat,
            sppf_kernel,
            activation,
            reference_size,
            detection_layers,
            anchors,
            strides,
        } = from;

        let detection_layers = match (detection_layers, anchors, strides) {
            (Some(layers), None, None) => layers,
            (Some(_), _, _) => {
                bail!("detection_layers cannot be combined with flat anchors or strides")
            }
            (None, anchors, strides) => {
                let anchors = anchors.unwrap_or_else(AnchorSize::default_anchors);
                let strides = strides.unwrap_or_else(|| DEFAULT_STRIDES.to_vec());
                DetectionLayerConfig::group(&anchors, &strides, &feature_channels(widths))?
            }
        };

        Ok(Self {
            input_channels,
            num_classes,
            widths,
            c3k_repeat,
            sppf_kernel,
            activation,
            reference_size,
            detection_layers,
        })
    }
}

fn feature_channels(widths: [usize; 5]) -> [usize; 3] {
    let [_, _, w2, w3, w4] = widths;
    [w2, w3, w4]
}

impl ModelConfig {
    /// The reference configuration with `num_classes` classes.
    pub fn with_num_classes(num_classes: usize) -> Self {
        Self {
            num_classes,
            ..Default::default()
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let config: Self = json5::from_str(&text)
            .with_context(|| format!("failed to parse '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Channel counts of the three feature maps given to the detection head.
    pub fn feature_channels(&self) -> [usize; 3] {
        feature_channels(self.widths)
    }

    pub fn num_outputs(&self) -> usize {
        self.num_classes + 5
    }

    pub fn anchors_per_layer(&self) -> usize {
        self.detection_layers
            .first()
            .map(|layer| layer.num_anchors())
            .unwrap_or(0)
    }

    pub fn total_anchors(&self) -> usize {
        self.detection_layers
            .iter()
            .map(|layer| layer.num_anchors())
            .sum()
    }

    /// Checks that the configuration describes a buildable model.
    pub fn validate(&self) -> Result<()> {
        let Self {
            input_channels,
            num_classes,
            widths,
            c3k_repeat,
            sppf_kernel,
            reference_size,
            ref detection_layers,
            ..
        } = *self;

        ensure!(input_channels > 0, "input_channels must be positive");
        ensure!(num_classes > 0, "num_classes must be positive");
        ensure!(
            widths.iter().all(|&width| width >= 2),
            "every stage width must be at least 2, but get {:?}",
            widths
        );
        ensure!(c3k_repeat > 0, "c3k_repeat must be positive");
        ensure!(
            sppf_kernel % 2 == 1,
            "sppf_kernel must be odd, but get {}",
            sppf_kernel
        );
        ensure!(reference_size > 0, "reference_size must be positive");

        let feature_channels = self.feature_channels();
        ensure!(
            detection_layers.len() == feature_channels.len(),
            "the backbone exposes {} feature maps, but {} detection layers are configured",
            feature_channels.len(),
            detection_layers.len()
        );

        let anchors_per_layer = self.anchors_per_layer();
        ensure!(anchors_per_layer > 0, "detection layers must have anchors");

        for (index, (layer, &expect_c)) in detection_layers
            .iter()
            .zip(feature_channels.iter())
            .enumerate()
        {
            ensure!(
                layer.num_anchors() == anchors_per_layer,
                "detection layer {} has {} anchors, but layer 0 has {}",
                index,
                layer.num_anchors(),
                anchors_per_layer
            );
            ensure!(
                layer.in_c == expect_c,
                "detection layer {} expects {} input channels, but the backbone outputs {}",
                index,
                layer.in_c,
                expect_c
            );
            ensure!(layer.stride > 0, "detection layer {} has zero stride", index);
        }

        ensure!(
            detection_layers
                .iter()
                .tuple_windows()
                .all(|(prev, next)| prev.stride < next.stride),
            "detection layer strides must be strictly increasing"
        );

        Ok(())
    }
}
