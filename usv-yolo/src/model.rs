use crate::common::*;

pub use backbone::*;
mod backbone {
    use super::*;

    #[derive(Debug, Clone)]
    pub struct BackboneInit {
        pub input_channels: usize,
        pub widths: [usize; 5],
        pub c3k_repeat: usize,
        pub sppf_kernel: usize,
        pub activation: Activation,
    }

    impl BackboneInit {
        pub fn build<'p, P>(self, path: P) -> Result<Backbone>
        where
            P: Borrow<nn::Path<'p>>,
        {
            let path = path.borrow();
            let Self {
                input_channels,
                widths: [w0, w1, w2, w3, w4],
                c3k_repeat,
                sppf_kernel,
                activation,
            } = self;

            let down = |in_c, out_c| ConvBlockInit {
                s: 2,
                activation,
                ..ConvBlockInit::new(in_c, out_c, 3)
            };
            let c3k2 = |in_c, out_c| C3k2Init {
                repeat: c3k_repeat,
                activation,
                ..C3k2Init::new(in_c, out_c)
            };

            let stage1 = {
                let path = path / "stage1";
                vec![
                    Block::from(down(input_channels, w0).build(&path / "conv1")?),
                    down(w0, w1).build(&path / "conv2")?.into(),
                    c3k2(w1, w2).build(&path / "c3k2")?.into(),
                ]
            };
            let stage2 = {
                let path = path / "stage2";
                vec![
                    Block::from(down(w2, w2).build(&path / "conv")?),
                    c3k2(w2, w3).build(&path / "c3k2")?.into(),
                ]
            };
            let stage3 = {
                let path = path / "stage3";
                vec![
                    Block::from(down(w3, w3).build(&path / "conv")?),
                    c3k2(w3, w3).build(&path / "c3k2")?.into(),
                ]
            };
            let stage4 = {
                let path = path / "stage4";
                vec![
                    Block::from(down(w3, w4).build(&path / "conv")?),
                    c3k2(w4, w4).build(&path / "c3k2")?.into(),
                    SppfInit {
                        k: sppf_kernel,
                        activation,
                        ..SppfInit::new(w4, w4)
                    }
                    .build(&path / "sppf")?
                    .into(),
                ]
            };

            Ok(Backbone {
                stages: [stage1, stage2, stage3, stage4],
                out_channels: [w2, w3, w4],
            })
        }
    }

    /// Four sequential stages. The outputs of stages 1, 2 and 4 feed the
    /// detection head.
    #[derive(Debug)]
    pub struct Backbone {
        stages: [Vec<Block>; 4],
        out_channels: [usize; 3],
    }

    #[derive(Debug, TensorLike)]
    pub struct BackboneOutput {
        pub x1: Tensor,
        pub x2: Tensor,
        pub x4: Tensor,
    }

    impl BackboneOutput {
        pub fn head_inputs(&self) -> [&Tensor; 3] {
            [&self.x1, &self.x2, &self.x4]
        }
    }

    impl Backbone {
        pub fn forward(&self, xs: &Tensor) -> Result<BackboneOutput> {
            let [stage1, stage2, stage3, stage4] = &self.stages;
            let x1 = run_stage(stage1, xs)?;
            let x2 = run_stage(stage2, &x1)?;
            let x3 = run_stage(stage3, &x2)?;
            let x4 = run_stage(stage4, &x3)?;
            Ok(BackboneOutput { x1, x2, x4 })
        }

        /// Channel counts of the exposed feature maps.
        pub fn out_channels(&self) -> [usize; 3] {
            self.out_channels
        }

        /// Cumulative stride after each stage.
        pub fn stage_strides(&self) -> [usize; 4] {
            let mut stride = 1;
            let mut strides = [0; 4];
            for (stage, output) in self.stages.iter().zip(strides.iter_mut()) {
                stride *= stage
                    .iter()
                    .map(|block| match block {
                        Block::Conv(conv) => conv.stride(),
                        _ => 1,
                    })
                    .product::<usize>();
                *output = stride;
            }
            strides
        }

        /// Strides of the feature maps given to the detection head.
        pub fn feature_strides(&self) -> [usize; 3] {
            let [s1, s2, _, s4] = self.stage_strides();
            [s1, s2, s4]
        }

        /// The factor that input sizes must be divisible by.
        pub fn total_stride(&self) -> usize {
            self.stage_strides()[3]
        }
    }

    fn run_stage(stage: &[Block], xs: &Tensor) -> Result<Tensor> {
        stage.iter().try_fold(xs.shallow_clone(), |xs, block| {
            let name: &str = block.as_ref();
            block
                .forward(&xs)?
                .tensor()
                .ok_or_else(|| format_err!("{} block does not output a tensor", name))
        })
    }
}

pub use yolo_model::*;
mod yolo_model {
    use super::*;

    #[derive(Debug, CopyGetters)]
    pub struct YoloModel {
        #[getset(get_copy = "pub")]
        input_channels: usize,
        #[getset(get_copy = "pub")]
        num_classes: usize,
        declared_strides: Vec<usize>,
        backbone: Backbone,
        head: Block,
    }

    impl YoloModel {
        pub fn new<'p, P>(path: P, config: &ModelConfig) -> Result<Self>
        where
            P: Borrow<nn::Path<'p>>,
        {
            let path = path.borrow();
            config.validate()?;

            let ModelConfig {
                input_channels,
                num_classes,
                widths,
                c3k_repeat,
                sppf_kernel,
                activation,
                reference_size,
                ref detection_layers,
            } = *config;

            let backbone = BackboneInit {
                input_channels,
                widths,
                c3k_repeat,
                sppf_kernel,
                activation,
            }
            .build(path / "backbone")?;

            let head = DetectHeadInit {
                num_classes,
                layers: detection_layers
                    .iter()
                    .map(|layer| DetectLayerInit {
                        in_c: layer.in_c,
                        anchors: layer
                            .anchors
                            .iter()
                            .map(|anchor| anchor.to_ratio(reference_size))
                            .collect(),
                    })
                    .collect(),
            }
            .build(path / "head")?;

            let declared_strides: Vec<_> = detection_layers.iter().map(|layer| layer.stride).collect();
            let feature_strides = backbone.feature_strides();
            if declared_strides[..] != feature_strides[..] {
                info!(
                    "declared detection strides {:?} differ from the feature map strides {:?}",
                    declared_strides, feature_strides
                );
            }

            Ok(Self {
                input_channels,
                num_classes,
                declared_strides,
                backbone,
                head: head.into(),
            })
        }

        /// Runs the backbone and the detection head in inference mode.
        ///
        /// The input must be `[batch, input_channels, height, width]` with
        /// both spatial sizes divisible by the total backbone stride.
        pub fn forward(&self, xs: &Tensor) -> Result<RawPrediction> {
            ensure!(
                xs.dim() == 4,
                "expect a [batch, channel, height, width] input, but get shape {:?}",
                xs.size()
            );
            let (_b, c, h, w) = xs.size4()?;
            ensure!(
                c == self.input_channels as i64,
                "expect {} input channels, but get {}",
                self.input_channels,
                c
            );
            let total_stride = self.backbone.total_stride() as i64;
            ensure!(
                h > 0 && w > 0 && h % total_stride == 0 && w % total_stride == 0,
                "input size {}x{} must be a positive multiple of {}",
                h,
                w,
                total_stride
            );

            tch::no_grad(|| {
                let features = self.backbone.forward(xs)?;
                self.head
                    .forward(&features.head_inputs()[..])?
                    .prediction()
                    .ok_or_else(|| format_err!("detection head does not output a prediction"))
            })
        }

        pub fn backbone(&self) -> &Backbone {
            &self.backbone
        }

        /// Strides that the architecture actually produces at the head inputs.
        pub fn feature_strides(&self) -> [usize; 3] {
            self.backbone.feature_strides()
        }

        /// Strides as written in the model configuration.
        pub fn declared_strides(&self) -> &[usize] {
            &self.declared_strides
        }
    }
}
