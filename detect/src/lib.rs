mod common;
pub mod config;

use crate::{
    common::*,
    config::{Config, InputKind},
};

/// One detection line of the output.
#[derive(Debug, Serialize)]
pub struct OutputRecord<'a> {
    pub image: &'a str,
    pub class_name: Option<&'a str>,
    #[serde(flatten)]
    pub detection: &'a Detection,
}

pub fn start(config: &Config) -> Result<()> {
    let model_config = model_config::ModelConfig::load(&config.model.cfg_file)?;

    if let Some(class_names) = &config.input.class_names {
        ensure!(
            class_names.len() == model_config.num_classes,
            "{} class names are given, but the model has {} classes",
            class_names.len(),
            model_config.num_classes
        );
    }

    let detector = Detector::new(config.model.device, &model_config, &config.postprocess)?;

    let image_size = config.postprocess.image_size as i64;
    let batch_size = config.input.batch_size.get();
    let input_channels = model_config.input_channels as i64;

    let stdout = io::stdout();
    let mut output = OutputWriter {
        detector: &detector,
        class_names: config.input.class_names.as_deref(),
        stdout: stdout.lock(),
    };

    match &config.input.kind {
        InputKind::Images { pattern } => {
            ensure!(
                input_channels == 3,
                "image input requires a 3-channel model, but get {} channels",
                input_channels
            );
            let files: Vec<PathBuf> = glob::glob(pattern)?.collect::<Result<_, _>>()?;
            info!("found {} images", files.len());

            for (batch_index, chunk) in files.chunks(batch_size).enumerate() {
                let images: Vec<_> = chunk
                    .iter()
                    .map(|path| load_image(path, image_size))
                    .try_collect()?;
                let names: Vec<_> = chunk
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect();
                output.run(batch_index, &names, &Tensor::stack(&images, 0))?;
            }
        }
        InputKind::Random { num_batches } => {
            for batch_index in 0..num_batches.get() {
                let names: Vec<_> = (0..batch_size)
                    .map(|index| format!("random-{}", batch_index * batch_size + index))
                    .collect();
                let images = Tensor::rand(
                    &[batch_size as i64, input_channels, image_size, image_size],
                    (Kind::Float, Device::Cpu),
                );
                output.run(batch_index, &names, &images)?;
            }
        }
    }

    Ok(())
}

struct OutputWriter<'a, W> {
    detector: &'a Detector,
    class_names: Option<&'a [String]>,
    stdout: W,
}

impl<W> OutputWriter<'_, W>
where
    W: io::Write,
{
    /// Detects one batch and prints a JSON line per detection.
    fn run(&mut self, batch_index: usize, names: &[String], images: &Tensor) -> Result<()> {
        let since = Instant::now();
        let detections = self.detector.detect(images)?;
        info!(
            "batch {} with {} images took {:?}",
            batch_index,
            names.len(),
            since.elapsed()
        );

        for (name, detections) in names.iter().zip(detections.iter()) {
            for detection in detections {
                let class_name = self
                    .class_names
                    .and_then(|names| names.get(detection.class_id))
                    .map(String::as_str);
                let record = OutputRecord {
                    image: name,
                    class_name,
                    detection,
                };
                serde_json::to_writer(&mut self.stdout, &record)?;
                writeln!(self.stdout)?;
            }
        }

        Ok(())
    }
}

/// Loads an image as a `[3, size, size]` tensor scaled to `[0, 1]`.
fn load_image(path: &Path, size: i64) -> Result<Tensor> {
    let image = tch::vision::image::load_and_resize(path, size, size)
        .with_context(|| format!("failed to load image '{}'", path.display()))?;
    Ok(image.to_kind(Kind::Float) / 255.0)
}
