use std::path::PathBuf;

use imagenet_classify::vision::models::ModelKind;
use imagenet_classify::vision::weights::{default_cache_dir, WeightSource, CACHE_DIR_ENV};

use test_utils::*;

// Single test in this binary as it mutates the process environment.
#[test]
fn cache_dir_and_lookup() {
    let cache_dir =
        std::env::temp_dir().join(format!("imagenet-classify-cache-{}", std::process::id()));
    std::env::set_var(CACHE_DIR_ENV, &cache_dir);
    assert_eq!(default_cache_dir(), cache_dir);

    std::env::remove_var(CACHE_DIR_ENV);
    std::env::set_var("XDG_CACHE_HOME", "/tmp/xdg");
    assert_eq!(default_cache_dir(), PathBuf::from("/tmp/xdg/imagenet-classify"));

    // A cached file is used as is, even offline.
    std::fs::create_dir_all(&cache_dir).unwrap();
    let cached = cache_dir.join("squeezenet1_1.ot");
    std::fs::write(&cached, b"weights").unwrap();
    let source = WeightSource::Hub { cache_dir: cache_dir.clone(), offline: true };
    assert_eq!(source.resolve(ModelKind::SqueezeNet1_1).unwrap(), cached);
    assert!(source.resolve(ModelKind::SqueezeNet1_0).is_err());

    let explicit = TmpFile::write("explicit", "ot", "weights");
    let source = WeightSource::File(explicit.as_ref().to_path_buf());
    assert_eq!(source.resolve(ModelKind::Vgg16).unwrap(), explicit.as_ref());

    std::fs::remove_dir_all(&cache_dir).unwrap();
}
