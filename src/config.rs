//! Command line and environment configuration.
use std::path::PathBuf;

use clap::Parser;
use tch::Device;

use crate::vision::imagenet::CATEGORIES_FILE;
use crate::vision::models::ModelKind;
use crate::vision::transform::{DataConfigOverrides, Interpolation};
use crate::vision::weights::{default_cache_dir, WeightSource, CACHE_DIR_ENV};
use crate::{ClassifyError, Result};

#[derive(Parser, Debug, Clone)]
#[command(author, version, long_about = None)]
#[command(about = "Classify an image with a pretrained ImageNet model")]
pub struct Args {
    /// The image to classify.
    #[arg(env = "IMAGENET_CLASSIFY_IMAGE", default_value = "dog.jpg")]
    pub image: PathBuf,

    /// Model architecture, e.g. resnet18, densenet121, efficientnet-b0.
    #[arg(long, env = "IMAGENET_CLASSIFY_MODEL", default_value = "resnet18")]
    pub model: String,

    /// Explicit weight file, bypassing the cache.
    #[arg(long, env = "IMAGENET_CLASSIFY_WEIGHTS")]
    pub weights: Option<PathBuf>,

    /// Directory holding downloaded weights.
    #[arg(long, env = CACHE_DIR_ENV)]
    pub cache_dir: Option<PathBuf>,

    /// Never download weights, fail if they are not cached.
    #[arg(long)]
    pub offline: bool,

    /// Category names, one per line in class index order.
    #[arg(long, env = "IMAGENET_CLASSIFY_LABELS", default_value = CATEGORIES_FILE)]
    pub labels: PathBuf,

    /// Number of predictions to print.
    #[arg(long, default_value_t = 5)]
    pub top_k: i64,

    /// Run on CPU rather than on GPU.
    #[arg(long)]
    pub cpu: bool,

    /// Input size, either `S` for a square input or `C,H,W`.
    #[arg(long, value_delimiter = ',')]
    pub input_size: Option<Vec<u32>>,

    /// Fraction of the resized image kept by the center crop.
    #[arg(long)]
    pub crop_pct: Option<f64>,

    /// Resampling filter used by the resize step.
    #[arg(long, value_enum)]
    pub interpolation: Option<Interpolation>,

    /// Per-channel normalization mean, `R,G,B`.
    #[arg(long, value_delimiter = ',')]
    pub mean: Option<Vec<f64>>,

    /// Per-channel normalization standard deviation, `R,G,B`.
    #[arg(long, value_delimiter = ',')]
    pub std: Option<Vec<f64>>,
}

fn rgb_triplet(name: &str, values: &Option<Vec<f64>>) -> Result<Option<[f64; 3]>> {
    match values.as_deref() {
        None => Ok(None),
        Some(&[r, g, b]) => Ok(Some([r, g, b])),
        Some(v) => {
            Err(ClassifyError::Config(format!("--{name} expects 3 values, got {}", v.len())))
        }
    }
}

impl Args {
    pub fn model_kind(&self) -> Result<ModelKind> {
        self.model.parse()
    }

    pub fn device(&self) -> Device {
        if self.cpu {
            Device::Cpu
        } else {
            Device::cuda_if_available()
        }
    }

    pub fn weight_source(&self) -> WeightSource {
        match &self.weights {
            Some(path) => WeightSource::File(path.clone()),
            None => WeightSource::Hub {
                cache_dir: self.cache_dir.clone().unwrap_or_else(default_cache_dir),
                offline: self.offline,
            },
        }
    }

    pub fn data_overrides(&self) -> Result<DataConfigOverrides> {
        let input_size = match self.input_size.as_deref() {
            None => None,
            Some(&[s]) => Some((3, s, s)),
            Some(&[c, h, w]) => Some((c, h, w)),
            Some(v) => {
                return Err(ClassifyError::Config(format!(
                    "--input-size expects 1 or 3 values, got {}",
                    v.len()
                )))
            }
        };
        Ok(DataConfigOverrides {
            input_size,
            crop_pct: self.crop_pct,
            interpolation: self.interpolation,
            mean: rgb_triplet("mean", &self.mean)?,
            std: rgb_triplet("std", &self.std)?,
        })
    }
}
