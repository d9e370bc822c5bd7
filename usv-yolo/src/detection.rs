use crate::common::*;

/// A detected object in pixel coordinates of the configured image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: XYXY<f32>,
    /// Objectness times class score.
    pub confidence: f32,
    pub class_id: usize,
}

impl Detection {
    pub fn xyxy(&self) -> [f32; 4] {
        self.bbox.xyxy()
    }
}
