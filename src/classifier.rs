//! Running a pretrained network on a single image.
use std::io::Write;
use std::path::Path;

use image::RgbImage;
use tch::nn::{self, ModuleT};
use tch::{Device, Kind, Tensor};

use crate::vision::image::load_rgb;
use crate::vision::imagenet::{self, Categories, Prediction};
use crate::vision::models::ModelKind;
use crate::vision::transform::{resolve_data_config, DataConfig, DataConfigOverrides, Transform};
use crate::vision::weights::WeightSource;
use crate::{ClassifyError, Result};

/// A network in evaluation mode together with its preprocessing.
pub struct Classifier {
    kind: ModelKind,
    net: Box<dyn ModuleT>,
    vs: nn::VarStore,
    transform: Transform,
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("kind", &self.kind)
            .field("device", &self.vs.device())
            .field("transform", &self.transform)
            .finish()
    }
}

impl Classifier {
    /// Wraps a network whose variables live in `vs`, using the model's default
    /// preprocessing.
    pub fn new(kind: ModelKind, vs: nn::VarStore, net: Box<dyn ModuleT>) -> Result<Self> {
        let transform = transform_for(kind, kind.data_config())?;
        Ok(Self { kind, net, vs, transform })
    }

    /// Builds `kind` with randomly initialized weights on `device`.
    pub fn untrained(kind: ModelKind, device: Device) -> Result<Self> {
        let vs = nn::VarStore::new(device);
        let net = kind.build(&vs.root(), imagenet::CLASS_COUNT);
        Self::new(kind, vs, net)
    }

    /// Builds `kind` and loads its pretrained ImageNet weights.
    pub fn from_pretrained(
        kind: ModelKind,
        weights: &WeightSource,
        device: Device,
    ) -> Result<Self> {
        let path = weights.resolve(kind)?;
        let mut classifier = Self::untrained(kind, device)?;
        classifier
            .vs
            .load(&path)
            .map_err(|err| ClassifyError::Weights(format!("{}: {}", path.display(), err)))?;
        classifier.vs.freeze();
        tracing::info!(model = %kind, weights = ?path, ?device, "loaded pretrained model");
        Ok(classifier)
    }

    /// Replaces the default preprocessing parameters with `overrides`.
    pub fn with_overrides(mut self, overrides: &DataConfigOverrides) -> Result<Self> {
        let config = resolve_data_config(overrides, self.kind.data_config());
        self.transform = transform_for(self.kind, config)?;
        Ok(self)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn device(&self) -> Device {
        self.vs.device()
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Transforms the image and adds the batch dimension: `[1, 3, H, W]`.
    pub fn preprocess(&self, image: &RgbImage) -> Result<Tensor> {
        Ok(self.transform.apply(image)?.unsqueeze(0).to_device(self.device()))
    }

    /// Forward pass without gradient tracking followed by a softmax over the
    /// classes of the single output row.
    ///
    /// Expects a `[1, 3, H, W]` batch and returns a `[nclasses]` CPU tensor.
    pub fn probabilities(&self, batch: &Tensor) -> Result<Tensor> {
        let size = batch.size();
        match size.as_slice() {
            &[1, 3, h, w] if self.kind.accepts_input_size(h, w) => {}
            &[1, 3, h, w] => {
                let msg = format!("{h}x{w} input, {}", size_requirement(self.kind));
                return Err(ClassifyError::Shape(msg));
            }
            _ => {
                let msg = format!("expected a [1, 3, H, W] batch, got {size:?}");
                return Err(ClassifyError::Shape(msg));
            }
        }
        let logits = tch::no_grad(|| self.net.forward_t(batch, false));
        let probabilities = logits.f_get(0)?.f_softmax(-1, Kind::Float)?;
        Ok(probabilities.to_device(Device::Cpu))
    }

    /// Loads the image at `path` and returns its class probabilities.
    pub fn classify_file<T: AsRef<Path>>(&self, path: T) -> Result<Tensor> {
        let image = load_rgb(path)?;
        self.probabilities(&self.preprocess(&image)?)
    }

    /// The `k` most likely classes for the image at `path`.
    pub fn top_k<T: AsRef<Path>>(
        &self,
        path: T,
        categories: &Categories,
        k: i64,
    ) -> Result<Vec<Prediction>> {
        imagenet::predictions(&self.classify_file(path)?, categories, k)
    }

    /// Classifies the image at `path` and writes the report for the `k` most
    /// likely classes to `out`, naming them from the label file at `labels`.
    ///
    /// Nothing is written when the image cannot be classified.
    pub fn report<W: Write, P: AsRef<Path>, L: AsRef<Path>>(
        &self,
        out: &mut W,
        path: P,
        labels: L,
        k: i64,
    ) -> Result<()> {
        let probabilities = self.classify_file(path)?;
        let categories = imagenet::load_categories(&labels)?;
        imagenet::report(out, &probabilities, &categories, labels.as_ref(), k)
    }
}

fn size_requirement(kind: ModelKind) -> String {
    match kind.input_size_range() {
        (min, u32::MAX) => format!("{kind} expects inputs of at least {min}x{min}"),
        (min, max) => format!("{kind} expects inputs between {min}x{min} and {max}x{max}"),
    }
}

fn transform_for(kind: ModelKind, config: DataConfig) -> Result<Transform> {
    let (_, h, w) = config.input_size;
    if !kind.accepts_input_size(h.into(), w.into()) {
        let msg = format!("input size {h}x{w}, {}", size_requirement(kind));
        return Err(ClassifyError::Config(msg));
    }
    Transform::new(config)
}
