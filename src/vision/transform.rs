//! Evaluation-time preprocessing.
//!
//! A [`Transform`] resizes so that a centered crop of the requested size
//! keeps `crop_pct` of the resized image, crops it, scales pixel values to
//! `[0, 1]` and normalizes each channel with the model's statistics.
use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tch::{Kind, Tensor};

use super::image::rgb_to_tensor;
use crate::{ClassifyError, Result};

pub const IMAGENET_DEFAULT_MEAN: [f64; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_DEFAULT_STD: [f64; 3] = [0.229, 0.224, 0.225];
pub const DEFAULT_CROP_PCT: f64 = 0.875;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Interpolation {
    Nearest,
    Bilinear,
    Bicubic,
}

impl Interpolation {
    fn filter(&self) -> FilterType {
        match self {
            Interpolation::Nearest => FilterType::Nearest,
            Interpolation::Bilinear => FilterType::Triangle,
            Interpolation::Bicubic => FilterType::CatmullRom,
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Bicubic => "bicubic",
        };
        f.write_str(s)
    }
}

impl FromStr for Interpolation {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(Interpolation::Nearest),
            "bilinear" => Ok(Interpolation::Bilinear),
            "bicubic" => Ok(Interpolation::Bicubic),
            _ => Err(ClassifyError::Config(format!("unknown interpolation '{s}'"))),
        }
    }
}

/// Preprocessing parameters expected by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    /// (channels, height, width)
    pub input_size: (u32, u32, u32),
    pub crop_pct: f64,
    pub interpolation: Interpolation,
    pub mean: [f64; 3],
    pub std: [f64; 3],
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input_size: (3, 224, 224),
            crop_pct: DEFAULT_CROP_PCT,
            interpolation: Interpolation::Bilinear,
            mean: IMAGENET_DEFAULT_MEAN,
            std: IMAGENET_DEFAULT_STD,
        }
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<()> {
        let (c, h, w) = self.input_size;
        if c != 3 {
            return Err(ClassifyError::Config(format!("expected 3 input channels, got {c}")));
        }
        if h == 0 || w == 0 {
            return Err(ClassifyError::Config(format!("empty input size {h}x{w}")));
        }
        if !(self.crop_pct > 0.0 && self.crop_pct <= 1.0) {
            return Err(ClassifyError::Config(format!(
                "crop_pct must be in (0, 1], got {}",
                self.crop_pct
            )));
        }
        if self.std.iter().any(|&s| s <= 0.0) {
            return Err(ClassifyError::Config(format!("std must be positive, got {:?}", self.std)));
        }
        Ok(())
    }
}

/// User supplied values taking precedence over a model's [`DataConfig`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataConfigOverrides {
    pub input_size: Option<(u32, u32, u32)>,
    pub crop_pct: Option<f64>,
    pub interpolation: Option<Interpolation>,
    pub mean: Option<[f64; 3]>,
    pub std: Option<[f64; 3]>,
}

/// Merges `overrides` on top of `defaults`, field by field.
pub fn resolve_data_config(overrides: &DataConfigOverrides, defaults: DataConfig) -> DataConfig {
    DataConfig {
        input_size: overrides.input_size.unwrap_or(defaults.input_size),
        crop_pct: overrides.crop_pct.unwrap_or(defaults.crop_pct),
        interpolation: overrides.interpolation.unwrap_or(defaults.interpolation),
        mean: overrides.mean.unwrap_or(defaults.mean),
        std: overrides.std.unwrap_or(defaults.std),
    }
}

#[derive(Debug, Clone)]
pub struct Transform {
    config: DataConfig,
}

impl Transform {
    pub fn new(config: DataConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Size of the image before cropping, as (width, height).
    ///
    /// Square inputs resize the shorter side and keep the aspect ratio,
    /// other inputs resize both sides independently.
    pub fn resize_dims(&self, width: u32, height: u32) -> (u32, u32) {
        let (_, crop_h, crop_w) = self.config.input_size;
        let scale = |v: u32| (v as f64 / self.config.crop_pct).floor() as u32;
        if crop_h != crop_w {
            return (scale(crop_w), scale(crop_h));
        }
        let size = scale(crop_h);
        if width <= height {
            let h = (size as u64 * height as u64 / width.max(1) as u64) as u32;
            (size, h.max(1))
        } else {
            let w = (size as u64 * width as u64 / height.max(1) as u64) as u32;
            (w.max(1), size)
        }
    }

    /// Top-left corner of the centered crop, as (x, y).
    pub fn crop_origin(&self, width: u32, height: u32) -> (u32, u32) {
        let (_, crop_h, crop_w) = self.config.input_size;
        let x = ((width.saturating_sub(crop_w)) as f64 / 2.0).round() as u32;
        let y = ((height.saturating_sub(crop_h)) as f64 / 2.0).round() as u32;
        (x, y)
    }

    /// Resized and center-cropped image, before tensor conversion.
    pub fn resize_and_crop(&self, image: &RgbImage) -> RgbImage {
        let (_, crop_h, crop_w) = self.config.input_size;
        let (w, h) = self.resize_dims(image.width(), image.height());
        let resized = imageops::resize(image, w, h, self.config.interpolation.filter());
        let (x, y) = self.crop_origin(w, h);
        imageops::crop_imm(&resized, x, y, crop_w, crop_h).to_image()
    }

    /// Scales a [3, H, W] uint8 tensor to [0, 1] and normalizes each channel.
    pub fn normalize(&self, tensor: &Tensor) -> Result<Tensor> {
        let mean = Tensor::from_slice(&self.config.mean.map(|v| v as f32)).view([3, 1, 1]);
        let std = Tensor::from_slice(&self.config.std.map(|v| v as f32)).view([3, 1, 1]);
        let tensor = tensor.to_kind(Kind::Float) / 255.0;
        Ok(tensor.f_sub(&mean)?.f_div(&std)?)
    }

    /// Returns a [3, H, W] float tensor.
    pub fn apply(&self, image: &RgbImage) -> Result<Tensor> {
        let cropped = self.resize_and_crop(image);
        self.normalize(&rgb_to_tensor(&cropped)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(size: u32, crop_pct: f64) -> Transform {
        Transform::new(DataConfig { input_size: (3, size, size), crop_pct, ..Default::default() })
            .unwrap()
    }

    #[test]
    fn shorter_side_resize() {
        let t = transform(224, 0.875);
        assert_eq!(t.resize_dims(640, 480), (341, 256));
        assert_eq!(t.resize_dims(480, 640), (256, 341));
        assert_eq!(t.resize_dims(300, 300), (256, 256));
    }

    #[test]
    fn crop_is_centered() {
        let t = transform(224, 0.875);
        assert_eq!(t.crop_origin(341, 256), (59, 16));
        assert_eq!(t.crop_origin(224, 224), (0, 0));
    }

    #[test]
    fn crop_fits_resized_image() {
        let t = transform(224, 1.0);
        for (w, h) in [(1, 50), (50, 1), (224, 224), (225, 300)] {
            assert_eq!(t.resize_and_crop(&RgbImage::new(w, h)).dimensions(), (224, 224));
        }
    }

    #[test]
    fn overrides_apply_per_field() {
        let overrides = DataConfigOverrides {
            crop_pct: Some(1.0),
            interpolation: Some(Interpolation::Bicubic),
            ..Default::default()
        };
        let config = resolve_data_config(&overrides, DataConfig::default());
        assert_eq!(config.crop_pct, 1.0);
        assert_eq!(config.interpolation, Interpolation::Bicubic);
        assert_eq!(config.input_size, (3, 224, 224));
        assert_eq!(config.mean, IMAGENET_DEFAULT_MEAN);
    }

    #[test]
    fn invalid_configs() {
        let bad_crop = DataConfig { crop_pct: 1.5, ..Default::default() };
        assert!(Transform::new(bad_crop).is_err());
        let bad_std = DataConfig { std: [0.2, 0.0, 0.2], ..Default::default() };
        assert!(Transform::new(bad_std).is_err());
        assert!("lanczos".parse::<Interpolation>().is_err());
        assert_eq!("Bicubic".parse::<Interpolation>().unwrap(), Interpolation::Bicubic);
    }
}
