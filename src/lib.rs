//! Pretrained ImageNet classification on top of libtorch.
//!
//! The pipeline mirrors the usual pretrained-model workflow: pick a network
//! from the [`vision::models`] zoo, fetch its weights, derive the matching
//! [`vision::transform::Transform`], then run a single image through
//! [`Classifier`] and read off the top predictions.
mod error;
pub use error::{ClassifyError, Result};

pub mod classifier;
pub use classifier::Classifier;

pub mod config;
pub mod vision;

/// Installs the stderr log subscriber, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
