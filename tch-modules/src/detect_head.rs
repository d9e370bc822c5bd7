use crate::{common::*, prediction::*};

#[derive(Debug, Clone)]
pub struct DetectLayerInit {
    pub in_c: usize,
    /// Anchor sizes relative to the input resolution.
    pub anchors: Vec<WH<f64>>,
}

#[derive(Debug, Clone)]
pub struct DetectHeadInit {
    pub num_classes: usize,
    pub layers: Vec<DetectLayerInit>,
}

impl DetectHeadInit {
    pub fn build<'p, P>(self, path: P) -> Result<DetectHead>
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let Self {
            num_classes,
            layers,
        } = self;

        ensure!(num_classes > 0, "num_classes must be positive");
        ensure!(!layers.is_empty(), "detection head needs at least one layer");
        ensure!(
            layers.iter().map(|layer| layer.anchors.len()).all_equal()
                && !layers[0].anchors.is_empty(),
            "every detection layer must have the same positive number of anchors"
        );

        for (index, layer) in layers.iter().enumerate() {
            debug!(
                "detection layer {}: {} input channels, anchors {:?} (ratio)",
                index,
                layer.in_c,
                layer.anchors.iter().map(|anchor| [anchor.w(), anchor.h()]).collect::<Vec<_>>()
            );
        }

        let num_outputs = num_classes as i64 + 5;
        let projections: Vec<_> = layers
            .iter()
            .enumerate()
            .map(|(index, layer)| {
                nn::conv2d(
                    path / format!("layer_{}", index),
                    layer.in_c as i64,
                    layer.anchors.len() as i64 * num_outputs,
                    1,
                    Default::default(),
                )
            })
            .collect();

        Ok(DetectHead {
            num_classes,
            layers,
            projections,
        })
    }
}

/// Projects each feature map to per-anchor predictions and merges all layers
/// into one [RawPrediction].
#[derive(Debug, CopyGetters)]
pub struct DetectHead {
    #[getset(get_copy = "pub")]
    num_classes: usize,
    layers: Vec<DetectLayerInit>,
    projections: Vec<nn::Conv2D>,
}

impl DetectHead {
    pub fn forward(&self, features: &[&Tensor]) -> Result<RawPrediction> {
        let Self {
            num_classes,
            ref layers,
            ref projections,
        } = *self;

        ensure!(
            features.len() == layers.len(),
            "detection head expects {} feature maps, but get {}",
            layers.len(),
            features.len()
        );

        let num_outputs = num_classes as i64 + 5;
        let mut batch_size = None;
        let mut start = 0;
        let mut outputs = vec![];
        let mut infos = vec![];

        for (index, (xs, layer, conv)) in izip!(features, layers, projections).enumerate() {
            let (b, c, h, w) = xs.size4()?;
            ensure!(
                c == layer.in_c as i64,
                "detection layer {} expects {} input channels, but get {}",
                index,
                layer.in_c,
                c
            );
            ensure!(
                *batch_size.get_or_insert(b) == b,
                "feature maps have inconsistent batch sizes"
            );

            let num_anchors = layer.anchors.len() as i64;

            // [b, a * o, h, w] -> [b, a, h, w, o] -> [b, a * h * w, o]
            let ys = xs
                .apply(conv)
                .view([b, num_anchors, num_outputs, h, w])
                .permute(&[0, 1, 3, 4, 2])
                .contiguous()
                .view([b, -1, num_outputs]);

            let end = start + num_anchors * h * w;
            infos.push(LayerInfo {
                feature_size: GridSize { h, w },
                anchors: layer.anchors.clone(),
                flat_index_range: start..end,
            });
            outputs.push(ys);
            start = end;
        }

        RawPrediction::new(Tensor::cat(&outputs, 1), num_classes, infos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    fn head_init(num_classes: usize) -> DetectHeadInit {
        let anchors = vec![WH::from_wh([0.1, 0.2]); 3];
        DetectHeadInit {
            num_classes,
            layers: [8, 16, 32]
                .iter()
                .map(|&in_c| DetectLayerInit {
                    in_c,
                    anchors: anchors.clone(),
                })
                .collect(),
        }
    }

    #[test]
    fn merge_layers() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = head_init(1).build(&vs.root())?;

        let f1 = Tensor::randn(&[2, 8, 8, 8], FLOAT_CPU);
        let f2 = Tensor::randn(&[2, 16, 4, 4], FLOAT_CPU);
        let f3 = Tensor::randn(&[2, 32, 1, 1], FLOAT_CPU);
        let prediction = head.forward(&[&f1, &f2, &f3])?;

        assert_eq!(prediction.tensor().size(), vec![2, 3 * (64 + 16 + 1), 6]);
        let ranges: Vec<_> = prediction
            .layers()
            .iter()
            .map(|layer| layer.flat_index_range.clone())
            .collect();
        assert_eq!(ranges, vec![0..192, 192..240, 240..243]);
        assert_eq!(prediction.layers()[1].feature_size, GridSize { h: 4, w: 4 });
        Ok(())
    }

    #[test]
    fn row_layout_is_anchor_major() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = DetectHeadInit {
            num_classes: 1,
            layers: vec![DetectLayerInit {
                in_c: 4,
                anchors: vec![WH::from_wh([0.1, 0.1]); 2],
            }],
        }
        .build(&vs.root())?;

        let xs = Tensor::randn(&[1, 4, 2, 3], FLOAT_CPU);
        let prediction = head.forward(&[&xs])?;

        // recompute the projection and pick anchor 1, row 1, column 2
        let conv = &head.projections[0];
        let expect = xs.apply(conv).view([1, 2, 6, 2, 3]).i((0, 1, .., 1, 2));
        let actual = prediction.tensor().i((0, 6 + 3 + 2));
        assert!(actual.allclose(&expect, 1e-5, 1e-6, false));
        Ok(())
    }

    #[test]
    fn reject_channel_mismatch() -> Result<()> {
        let vs = nn::VarStore::new(Device::Cpu);
        let head = head_init(1).build(&vs.root())?;

        let f1 = Tensor::randn(&[1, 8, 8, 8], FLOAT_CPU);
        let f2 = Tensor::randn(&[1, 12, 4, 4], FLOAT_CPU);
        let f3 = Tensor::randn(&[1, 32, 1, 1], FLOAT_CPU);
        assert!(head.forward(&[&f1, &f2, &f3]).is_err());
        assert!(head.forward(&[&f1, &f3]).is_err());
        Ok(())
    }
}
