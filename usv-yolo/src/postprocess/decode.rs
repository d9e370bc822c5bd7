use crate::{common::*, detection::Detection};

/// Per-anchor boxes and scores of a whole batch.
#[derive(Debug, TensorLike)]
pub struct DecodedBatch {
    /// `[batch, num_predictions, 4]` corners in pixels.
    pub xyxy: Tensor,
    /// `[batch, num_predictions]` best class score.
    pub score: Tensor,
    /// `[batch, num_predictions]` index of the best class.
    pub class_id: Tensor,
    /// `[batch, num_predictions]` anchors that survive the score and size checks.
    pub mask: Tensor,
}

impl DecodedBatch {
    pub fn batch_size(&self) -> i64 {
        self.mask.size()[0]
    }

    /// Collects the surviving anchors of one image, in anchor order.
    pub fn candidates(&self, index: i64) -> Result<Vec<Detection>> {
        let keep = self.mask.i(index).nonzero().view([-1]);
        let xyxy = self
            .xyxy
            .i(index)
            .index_select(0, &keep)
            .to_device(Device::Cpu)
            .contiguous()
            .view([-1]);
        let score = self.score.i(index).index_select(0, &keep).to_device(Device::Cpu);
        let class_id = self
            .class_id
            .i(index)
            .index_select(0, &keep)
            .to_device(Device::Cpu);

        let xyxy = Vec::<f32>::from(&xyxy);
        let score = Vec::<f32>::from(&score);
        let class_id = Vec::<i64>::from(&class_id);

        izip!(xyxy.chunks(4), score, class_id)
            .map(|(corners, confidence, class_id)| -> Result<_> {
                let bbox = XYXY::try_from_xyxy([corners[0], corners[1], corners[2], corners[3]])?;
                Ok(Detection {
                    bbox,
                    confidence,
                    class_id: class_id as usize,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct DecoderInit {
    pub mode: DecodeMode,
    pub image_size: usize,
    pub confidence_threshold: R64,
}

impl DecoderInit {
    pub fn build(self) -> Result<Decoder> {
        let Self {
            mode,
            image_size,
            confidence_threshold,
        } = self;

        ensure!(image_size > 0, "image_size must be positive");
        ensure!(
            confidence_threshold >= 0.0,
            "confidence_threshold must be non-negative"
        );

        Ok(Decoder {
            mode,
            image_size: image_size as f64,
            confidence_threshold: confidence_threshold.raw(),
        })
    }
}

/// Turns raw head outputs into scored corner boxes.
#[derive(Debug, Clone)]
pub struct Decoder {
    mode: DecodeMode,
    image_size: f64,
    confidence_threshold: f64,
}

impl Decoder {
    pub fn forward(&self, prediction: &RawPrediction) -> Result<DecodedBatch> {
        tch::no_grad(|| {
            let Self {
                mode,
                image_size,
                confidence_threshold,
            } = *self;

            let raw = prediction.tensor().to_kind(Kind::Float);
            let squashed = raw.sigmoid();

            // normalized (cx, cy, w, h)
            let cxcywh = match mode {
                DecodeMode::Direct => squashed.i((.., .., 0..4)),
                DecodeMode::Grid => grid_boxes(&squashed, prediction.layers())?,
            };
            let cx = cxcywh.i((.., .., 0));
            let cy = cxcywh.i((.., .., 1));
            let w = cxcywh.i((.., .., 2));
            let h = cxcywh.i((.., .., 3));

            let x1 = (&cx - &w / 2.0) * image_size;
            let y1 = (&cy - &h / 2.0) * image_size;
            let x2 = (&cx + &w / 2.0) * image_size;
            let y2 = (&cy + &h / 2.0) * image_size;

            // score = objectness * class score, single label per anchor
            let obj = squashed.i((.., .., 4..5));
            let class = squashed.i((.., .., 5..));
            let (score, class_id) = (class * obj).max_dim(-1, false);

            let mask = raw
                .isfinite()
                .all_dim(-1, false)
                .logical_and(&score.gt(confidence_threshold))
                .logical_and(&x2.gt_tensor(&x1))
                .logical_and(&y2.gt_tensor(&y1));

            let xyxy = Tensor::stack(&[x1, y1, x2, y2], -1);

            Ok(DecodedBatch {
                xyxy,
                score,
                class_id,
                mask,
            })
        })
    }
}

/// Anchor-relative decoding: centers are offsets within the grid cell and
/// sizes scale the layer's anchors, which are already in ratio units.
fn grid_boxes(squashed: &Tensor, layers: &[LayerInfo]) -> Result<Tensor> {
    ensure!(!layers.is_empty(), "grid decoding requires the layer layout");
    let device = squashed.device();
    let batch_size = squashed.size()[0];

    let boxes: Vec<_> = layers
        .iter()
        .map(|layer| {
            let GridSize { h, w } = layer.feature_size;
            let num_anchors = layer.num_anchors() as i64;
            let range = &layer.flat_index_range;

            let xs = squashed
                .i((.., range.start..range.end, 0..4))
                .reshape(&[batch_size, num_anchors, h, w, 4]);

            let grid_x = Tensor::arange(w, (Kind::Float, device)).view([1, 1, 1, w]);
            let grid_y = Tensor::arange(h, (Kind::Float, device)).view([1, 1, h, 1]);
            let (anchor_w, anchor_h): (Vec<f32>, Vec<f32>) = layer
                .anchors
                .iter()
                .map(|anchor| (anchor.w() as f32, anchor.h() as f32))
                .unzip();
            let anchor_w = Tensor::of_slice(&anchor_w)
                .to_device(device)
                .view([1, num_anchors, 1, 1]);
            let anchor_h = Tensor::of_slice(&anchor_h)
                .to_device(device)
                .view([1, num_anchors, 1, 1]);

            let cx = (xs.i((.., .., .., .., 0)) * 2.0 - 0.5 + grid_x) / w as f64;
            let cy = (xs.i((.., .., .., .., 1)) * 2.0 - 0.5 + grid_y) / h as f64;
            let bw = (xs.i((.., .., .., .., 2)) * 2.0).pow(2.0) * anchor_w;
            let bh = (xs.i((.., .., .., .., 3)) * 2.0).pow(2.0) * anchor_h;

            Tensor::stack(&[cx, cy, bw, bh], -1).view([batch_size, -1, 4])
        })
        .collect();

    Ok(Tensor::cat(&boxes, 1))
}
