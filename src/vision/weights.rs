//! Locating pretrained weight files.
//!
//! Weights are the `.ot` files published alongside the tch-rs releases. They
//! are looked up in a local cache directory and downloaded there on first use.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::models::ModelKind;
use crate::{ClassifyError, Result};

pub const CACHE_DIR_ENV: &str = "IMAGENET_CLASSIFY_CACHE";
const CACHE_SUBDIR: &str = "imagenet-classify";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeightSource {
    /// An explicit weight file.
    File(PathBuf),
    /// The cache directory, downloading missing files unless `offline` is set.
    Hub { cache_dir: PathBuf, offline: bool },
}

impl Default for WeightSource {
    fn default() -> Self {
        WeightSource::Hub { cache_dir: default_cache_dir(), offline: false }
    }
}

impl WeightSource {
    /// Returns the path of a local weight file for `kind`, fetching it if needed.
    pub fn resolve(&self, kind: ModelKind) -> Result<PathBuf> {
        match self {
            WeightSource::File(path) => {
                if !path.is_file() {
                    return Err(ClassifyError::Weights(format!("{} is not a file", path.display())));
                }
                Ok(path.clone())
            }
            WeightSource::Hub { cache_dir, offline } => {
                let path = cache_dir.join(kind.weight_file_name());
                if path.is_file() {
                    tracing::debug!(?path, "using cached weights");
                    return Ok(path);
                }
                if *offline {
                    return Err(ClassifyError::Weights(format!(
                        "{} not in cache and downloads are disabled",
                        path.display()
                    )));
                }
                fs::create_dir_all(cache_dir)
                    .map_err(|e| ClassifyError::Io(e).path_context(cache_dir))?;
                download(&kind.weight_url(), &path)?;
                Ok(path)
            }
        }
    }
}

/// `$IMAGENET_CLASSIFY_CACHE`, then `$XDG_CACHE_HOME/imagenet-classify`,
/// then `$HOME/.cache/imagenet-classify`, then `./.imagenet-classify`.
pub fn default_cache_dir() -> PathBuf {
    let var = |name: &str| std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from);
    if let Some(dir) = var(CACHE_DIR_ENV) {
        dir
    } else if let Some(dir) = var("XDG_CACHE_HOME") {
        dir.join(CACHE_SUBDIR)
    } else if let Some(dir) = var("HOME") {
        dir.join(".cache").join(CACHE_SUBDIR)
    } else {
        PathBuf::from(format!(".{CACHE_SUBDIR}"))
    }
}

/// Downloads `source_url` to `target_file`.
///
/// The body is written to a `.part` sibling that is renamed once complete, so
/// an interrupted transfer never leaves a truncated weight file behind.
fn download(source_url: &str, target_file: &Path) -> Result<()> {
    tracing::info!(url = source_url, target = ?target_file, "downloading pretrained weights");
    let partial = target_file.with_extension("ot.part");
    let response = ureq::get(source_url).call()?;
    let response_code = response.status();
    if response_code != 200 {
        return Err(ClassifyError::Weights(format!(
            "unexpected response code {response_code} for {source_url}"
        )));
    }
    let written = {
        let f = fs::File::create(&partial)
            .map_err(|e| ClassifyError::Io(e).path_context(&partial))?;
        let mut writer = io::BufWriter::new(f);
        let mut reader = response.into_reader();
        let written = io::copy(&mut reader, &mut writer);
        written.and_then(|n| io::Write::flush(&mut writer).map(|_| n))
    };
    let written = match written {
        Ok(n) => n,
        Err(err) => {
            let _ = fs::remove_file(&partial);
            return Err(ClassifyError::Io(err).path_context(&partial));
        }
    };
    finish_download(&partial, target_file)?;
    tracing::info!(bytes = written, target = ?target_file, "download complete");
    Ok(())
}

/// Moves a completed `.part` file into place, removing it if that fails.
fn finish_download(partial: &Path, target_file: &Path) -> Result<()> {
    fs::rename(partial, target_file).map_err(|err| {
        let _ = fs::remove_file(partial);
        ClassifyError::Io(err).path_context(target_file)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_miss() {
        let cache_dir =
            std::env::temp_dir().join(format!("imagenet-classify-empty-{}", std::process::id()));
        let source = WeightSource::Hub { cache_dir, offline: true };
        match source.resolve(ModelKind::ResNet18) {
            Err(ClassifyError::Weights(msg)) => assert!(msg.contains("resnet18.ot")),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn failed_rename_removes_partial() {
        let dir =
            std::env::temp_dir().join(format!("imagenet-classify-rename-{}", std::process::id()));
        let target = dir.join("resnet18.ot");
        // A non-empty directory in the way of the weight file.
        fs::create_dir_all(target.join("occupied")).unwrap();
        let partial = target.with_extension("ot.part");
        fs::write(&partial, b"weights").unwrap();

        assert!(matches!(finish_download(&partial, &target), Err(ClassifyError::Io(_))));
        assert!(!partial.exists());
        assert!(target.is_dir());

        fs::remove_dir_all(&target).unwrap();
        fs::write(&partial, b"weights").unwrap();
        finish_download(&partial, &target).unwrap();
        assert!(!partial.exists());
        assert_eq!(fs::read(&target).unwrap(), b"weights");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_explicit_file() {
        let source = WeightSource::File(PathBuf::from("/definitely/not/here/resnet18.ot"));
        assert!(matches!(source.resolve(ModelKind::ResNet18), Err(ClassifyError::Weights(_))));
    }
}
