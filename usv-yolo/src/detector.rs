use crate::{common::*, detection::Detection, model::YoloModel, postprocess::Postprocess};

/// The model, its parameters and the postprocessing bundled together.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Detector {
    #[derivative(Debug = "ignore")]
    vs: nn::VarStore,
    model: YoloModel,
    postprocess: Postprocess,
}

impl Detector {
    pub fn new(
        device: Device,
        model_config: &ModelConfig,
        postprocess_config: &PostprocessConfig,
    ) -> Result<Self> {
        let vs = nn::VarStore::new(device);
        let model = YoloModel::new(&vs.root(), model_config)?;
        let postprocess = Postprocess::new(postprocess_config)?;

        let detector = Self {
            vs,
            model,
            postprocess,
        };
        info!(
            "detector has {} parameters, feature strides {:?}",
            detector.num_parameters(),
            detector.model.feature_strides()
        );

        Ok(detector)
    }

    pub fn num_parameters(&self) -> i64 {
        self.vs
            .trainable_variables()
            .iter()
            .map(|tensor| tensor.size().iter().product::<i64>())
            .sum()
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    pub fn model(&self) -> &YoloModel {
        &self.model
    }

    /// Detects objects in a `[batch, channel, height, width]` image batch.
    pub fn detect(&self, images: &Tensor) -> Result<Vec<Vec<Detection>>> {
        let images = images.to_device(self.device());
        let prediction = self.model.forward(&images)?;
        self.postprocess.forward(&prediction)
    }
}
