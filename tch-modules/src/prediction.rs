use crate::common::*;

/// Spatial size of a feature map in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize {
    pub h: i64,
    pub w: i64,
}

impl GridSize {
    pub fn num_cells(&self) -> i64 {
        self.h * self.w
    }
}

/// Where one detection layer's rows live in the merged prediction tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub feature_size: GridSize,
    /// Anchor sizes relative to the input resolution.
    pub anchors: Vec<WH<f64>>,
    pub flat_index_range: Range<i64>,
}

impl LayerInfo {
    pub fn num_anchors(&self) -> usize {
        self.anchors.len()
    }

    pub fn num_predictions(&self) -> i64 {
        self.num_anchors() as i64 * self.feature_size.num_cells()
    }
}

pub use raw_prediction::*;
mod raw_prediction {
    use super::*;

    /// Undecoded head output of shape `[batch, num_predictions, num_classes + 5]`.
    ///
    /// Rows are ordered by layer, then anchor, then grid row, then grid column.
    /// The last axis holds `(x, y, w, h, objectness, class logits..)`.
    #[derive(Debug, TensorLike, Getters, CopyGetters)]
    pub struct RawPrediction {
        #[getset(get = "pub")]
        tensor: Tensor,
        #[tensor_like(copy)]
        #[getset(get_copy = "pub")]
        num_classes: usize,
        #[tensor_like(clone)]
        #[getset(get = "pub")]
        layers: Vec<LayerInfo>,
    }

    impl RawPrediction {
        pub fn new(tensor: Tensor, num_classes: usize, layers: Vec<LayerInfo>) -> Result<Self> {
            ensure!(num_classes > 0, "num_classes must be positive");
            let (_batch_size, num_rows, num_outputs) = tensor.size3()?;
            ensure!(
                num_outputs == num_classes as i64 + 5,
                "expect {} values per prediction, but get {}",
                num_classes + 5,
                num_outputs
            );

            let end = layers.iter().try_fold(0, |start, layer| -> Result<_> {
                let range = &layer.flat_index_range;
                ensure!(
                    range.start == start && range.end - range.start == layer.num_predictions(),
                    "flat index range {:?} does not match the layer layout",
                    range
                );
                Ok(range.end)
            })?;
            ensure!(
                end == num_rows,
                "layers cover {} predictions, but the tensor has {}",
                end,
                num_rows
            );

            Ok(Self {
                tensor,
                num_classes,
                layers,
            })
        }

        pub fn batch_size(&self) -> i64 {
            self.tensor.size()[0]
        }

        pub fn num_predictions(&self) -> i64 {
            self.tensor.size()[1]
        }

        pub fn device(&self) -> Device {
            self.tensor.device()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    fn layer(h: i64, w: i64, start: i64) -> LayerInfo {
        let feature_size = GridSize { h, w };
        let anchors = vec![WH::from_wh([0.1, 0.1]); 2];
        let len = 2 * feature_size.num_cells();
        LayerInfo {
            feature_size,
            anchors,
            flat_index_range: start..(start + len),
        }
    }

    #[test]
    fn accept_consistent_layout() -> Result<()> {
        let layers = vec![layer(2, 3, 0), layer(1, 1, 12)];
        let prediction = RawPrediction::new(Tensor::zeros(&[4, 14, 7], FLOAT_CPU), 2, layers)?;
        assert_eq!(prediction.batch_size(), 4);
        assert_eq!(prediction.num_predictions(), 14);
        Ok(())
    }

    #[test]
    fn reject_inconsistent_layout() {
        let gap = vec![layer(2, 3, 0), layer(1, 1, 13)];
        assert!(RawPrediction::new(Tensor::zeros(&[1, 15, 7], FLOAT_CPU), 2, gap).is_err());

        let short = vec![layer(2, 3, 0)];
        assert!(RawPrediction::new(Tensor::zeros(&[1, 14, 7], FLOAT_CPU), 2, short).is_err());

        let layers = vec![layer(2, 3, 0), layer(1, 1, 12)];
        assert!(RawPrediction::new(Tensor::zeros(&[1, 14, 6], FLOAT_CPU), 2, layers).is_err());
    }
}
