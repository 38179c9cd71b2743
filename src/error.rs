use std::io;

use thiserror::Error;

/// Main library error type.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Weight download failure.
    #[error(transparent)]
    Download(#[from] Box<ureq::Error>),

    /// Image decoding error.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Invalid tensor shape.
    #[error("invalid shape: {0}")]
    Shape(String),

    /// Errors returned by libtorch.
    #[error(transparent)]
    Torch(#[from] tch::TchError),

    /// Model name not in the zoo.
    #[error("unknown model '{name}', expected one of: {known}")]
    UnknownModel { name: String, known: String },

    /// Pretrained weights could not be located.
    #[error("pretrained weights unavailable: {0}")]
    Weights(String),
}

impl From<ureq::Error> for ClassifyError {
    fn from(err: ureq::Error) -> Self {
        ClassifyError::Download(Box::new(err))
    }
}

impl ClassifyError {
    pub fn path_context(self, path: &std::path::Path) -> Self {
        match self {
            ClassifyError::Io(err) => {
                let msg = format!("{}: {}", path.display(), err);
                ClassifyError::Io(io::Error::new(err.kind(), msg))
            }
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;
