//! The `vision` module groups the image side of the pipeline: decoding,
//! preprocessing, the model zoo, pretrained weights and ImageNet labels.
pub mod image;

pub mod imagenet;

pub mod models;

pub mod transform;

pub mod weights;
