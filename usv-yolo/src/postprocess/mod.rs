//! Decoding and non-maximum suppression of raw head outputs.

mod decode;
mod nms;

pub use decode::*;
pub use nms::*;

use crate::{common::*, detection::Detection};

#[derive(Debug, Clone)]
pub struct Postprocess {
    decoder: Decoder,
    nms: Nms,
}

impl Postprocess {
    pub fn new(config: &PostprocessConfig) -> Result<Self> {
        config.validate()?;

        let PostprocessConfig {
            confidence_threshold,
            iou_threshold,
            image_size,
            decode,
        } = *config;

        let decoder = DecoderInit {
            mode: decode,
            image_size,
            confidence_threshold,
        }
        .build()?;
        let nms = NmsInit { iou_threshold }.build()?;

        Ok(Self { decoder, nms })
    }

    /// Decodes a batch of raw predictions and suppresses overlapping boxes.
    ///
    /// Returns one detection list per image in batch order. Images are
    /// suppressed in parallel.
    pub fn forward(&self, prediction: &RawPrediction) -> Result<Vec<Vec<Detection>>> {
        let decoded = self.decoder.forward(prediction)?;
        let candidates: Vec<_> = tch::no_grad(|| {
            (0..decoded.batch_size())
                .map(|index| decoded.candidates(index))
                .collect::<Result<_>>()
        })?;

        debug!(
            "{} candidates before suppression",
            candidates.iter().map(Vec::len).sum::<usize>()
        );

        let detections = candidates
            .into_par_iter()
            .map(|candidates| self.nms.forward(candidates))
            .collect();
        Ok(detections)
    }
}
