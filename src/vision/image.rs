//! Utility functions to load images and convert them to tensors.
use std::path::Path;

use image::{EncodableLayout, RgbImage};
use tch::{Kind, Tensor};

use crate::{ClassifyError, Result};

/// Loads an image from a file, converting it to 3-channel RGB.
///
/// Grayscale, alpha and 16-bit images are all accepted, the alpha channel is
/// dropped.
pub fn load_rgb<T: AsRef<Path>>(path: T) -> Result<RgbImage> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|err| match err {
        image::ImageError::IoError(err) => ClassifyError::Io(err).path_context(path),
        err => ClassifyError::Image(err),
    })?;
    tracing::debug!(?path, width = image.width(), height = image.height(), "decoded image");
    Ok(image.to_rgb8())
}

pub(crate) fn hwc_to_chw(tensor: &Tensor) -> Tensor {
    tensor.permute([2, 0, 1])
}

/// `h * w * 3` => `3 * h * w`, kind `Uint8`.
pub fn rgb_to_tensor(rgb: &RgbImage) -> Result<Tensor> {
    let size = [rgb.height() as i64, rgb.width() as i64, 3];
    let tensor = Tensor::f_from_data_size(rgb.as_bytes(), &size, Kind::Uint8)?;
    Ok(hwc_to_chw(&tensor))
}
