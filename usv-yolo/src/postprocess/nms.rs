use crate::{common::*, detection::Detection};

#[derive(Debug, Clone)]
pub struct NmsInit {
    pub iou_threshold: R64,
}

impl Default for NmsInit {
    fn default() -> Self {
        Self {
            iou_threshold: r64(0.45),
        }
    }
}

impl NmsInit {
    pub fn build(self) -> Result<Nms> {
        let Self { iou_threshold } = self;
        ensure!(
            (0.0..=1.0).contains(&iou_threshold.raw()),
            "iou_threshold must be in range [0, 1], but get {}",
            iou_threshold
        );
        Ok(Nms {
            iou_threshold: iou_threshold.raw() as f32,
        })
    }
}

/// Greedy class-wise non-maximum suppression.
#[derive(Debug, Clone)]
pub struct Nms {
    iou_threshold: f32,
}

impl Nms {
    /// Returns the kept detections sorted by descending confidence.
    ///
    /// Equal confidences keep their input order.
    pub fn forward(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        // stable sort
        detections.sort_by(|lhs, rhs| rhs.confidence.total_cmp(&lhs.confidence));

        let mut groups: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();
        for detection in detections {
            groups
                .entry(detection.class_id)
                .or_default()
                .push(detection);
        }

        let mut keep: Vec<_> = groups
            .into_values()
            .flat_map(|group| self.suppress(group))
            .collect();
        keep.sort_by(|lhs, rhs| rhs.confidence.total_cmp(&lhs.confidence));
        keep
    }

    fn suppress(&self, sorted: Vec<Detection>) -> Vec<Detection> {
        let mut suppressed = vec![false; sorted.len()];
        let mut keep = vec![];

        for (li, lhs) in sorted.iter().enumerate() {
            if suppressed[li] {
                continue;
            }

            for (ri, rhs) in sorted.iter().enumerate().skip(li + 1) {
                if !suppressed[ri] && lhs.bbox.iou_with(&rhs.bbox, 1e-8) > self.iou_threshold {
                    suppressed[ri] = true;
                }
            }
            keep.push(lhs.clone());
        }

        keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn detection(xyxy: [f32; 4], confidence: f32, class_id: usize) -> Detection {
        Detection {
            bbox: XYXY::from_xyxy(xyxy),
            confidence,
            class_id,
        }
    }

    #[test]
    fn suppress_by_iou_threshold() -> Result<()> {
        let detections = vec![
            detection([0.0, 0.0, 10.0, 10.0], 0.9, 0),
            detection([2.5, 0.0, 12.5, 10.0], 0.8, 0),
        ];

        let strict = NmsInit {
            iou_threshold: r64(0.45),
        }
        .build()?;
        let kept = strict.forward(detections.clone());
        assert_eq!(kept, vec![detections[0].clone()]);

        let loose = NmsInit {
            iou_threshold: r64(0.7),
        }
        .build()?;
        assert_eq!(loose.forward(detections.clone()), detections);
        Ok(())
    }

    #[test]
    fn classes_do_not_suppress_each_other() -> Result<()> {
        let nms = NmsInit::default().build()?;
        let kept = nms.forward(vec![
            detection([0.0, 0.0, 10.0, 10.0], 0.7, 1),
            detection([0.0, 0.0, 10.0, 10.0], 0.9, 0),
        ]);
        let classes: Vec<_> = kept.iter().map(|det| det.class_id).collect();
        assert_eq!(classes, vec![0, 1]);
        Ok(())
    }

    #[test]
    fn ties_keep_input_order() -> Result<()> {
        let nms = NmsInit::default().build()?;
        let first = detection([0.0, 0.0, 10.0, 10.0], 0.5, 0);
        let second = detection([1.0, 0.0, 11.0, 10.0], 0.5, 0);
        let far = detection([50.0, 50.0, 60.0, 60.0], 0.5, 0);

        let kept = nms.forward(vec![first.clone(), second, far.clone()]);
        assert_eq!(kept, vec![first, far]);
        Ok(())
    }

    #[test]
    fn kept_boxes_do_not_overlap() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let iou_threshold = 0.3;
        let nms = NmsInit {
            iou_threshold: r64(iou_threshold),
        }
        .build()?;

        let detections: Vec<_> = (0..200)
            .map(|_| {
                let x1 = rng.gen_range(0.0..90.0);
                let y1 = rng.gen_range(0.0..90.0);
                let w = rng.gen_range(1.0..20.0);
                let h = rng.gen_range(1.0..20.0);
                let class_id = rng.gen_range(0..3);
                detection([x1, y1, x1 + w, y1 + h], rng.gen(), class_id)
            })
            .collect();

        let kept = nms.forward(detections.clone());
        assert!(!kept.is_empty());
        assert!(kept
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));

        for (index, lhs) in kept.iter().enumerate() {
            for rhs in &kept[(index + 1)..] {
                if lhs.class_id == rhs.class_id {
                    assert!(lhs.bbox.iou_with(&rhs.bbox, 1e-8) <= iou_threshold as f32);
                }
            }
        }

        assert_eq!(nms.forward(detections), kept);
        Ok(())
    }
}
