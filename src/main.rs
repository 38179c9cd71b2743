// Classifies a single image with a pretrained ImageNet model and prints the
// top predictions.
//
// Weight files are fetched on first use from the tch-rs releases, e.g.
// https://github.com/LaurentMazare/tch-rs/releases/download/mw/resnet18.ot
// and kept in the cache directory (see --cache-dir). Category names are read
// from imagenet_classes.txt in the current directory when present.
use anyhow::{Context, Result};
use clap::Parser;
use imagenet_classify::config::Args;
use imagenet_classify::Classifier;

pub fn main() -> Result<()> {
    imagenet_classify::init_tracing();
    let args = Args::parse();
    let kind = args.model_kind()?;
    let overrides = args.data_overrides()?;

    let classifier = Classifier::from_pretrained(kind, &args.weight_source(), args.device())
        .with_context(|| format!("loading pretrained {kind}"))?
        .with_overrides(&overrides)?;
    tracing::debug!(
        model = %classifier.kind(),
        config = ?classifier.transform().config(),
        "resolved data config"
    );

    let stdout = std::io::stdout();
    classifier
        .report(&mut stdout.lock(), &args.image, &args.labels, args.top_k)
        .with_context(|| format!("classifying {}", args.image.display()))?;
    Ok(())
}
