use std::path::Path;

use imagenet_classify::vision::imagenet::{self, Categories, CLASS_COUNT};
use imagenet_classify::ClassifyError;
use tch::{Kind, Tensor};

use test_utils::*;

#[test]
fn load_categories_from_file() {
    let labels = TmpFile::write("labels", "txt", "tench\n  goldfish \r\ngreat white shark\t\n");
    let categories = imagenet::load_categories(&labels).unwrap();
    assert!(!categories.is_fallback());
    assert_eq!(categories.len(), 3);
    assert_eq!(categories.names(), ["tench", "goldfish", "great white shark"]);
}

#[test]
fn missing_categories_fall_back() {
    let labels = TmpFile::create("no-labels", "txt");
    let categories = imagenet::load_categories(&labels).unwrap();
    assert!(categories.is_fallback());
    assert_eq!(categories.len(), CLASS_COUNT as usize);
    let expected: Vec<String> = (0..1000).map(|i| format!("class_{i}")).collect();
    assert_eq!(categories.names(), expected.as_slice());
}

#[test]
fn unreadable_categories_propagate() {
    // A directory exists but cannot be read as a label file.
    let err = imagenet::load_categories(std::env::temp_dir()).unwrap_err();
    assert!(matches!(err, ClassifyError::Io(_)), "{err:?}");
}

#[test]
fn top_k_selects_largest() {
    tch::manual_seed(42);
    let logits = Tensor::randn([CLASS_COUNT], (Kind::Float, tch::Device::Cpu));
    let probabilities = logits.softmax(-1, Kind::Float);
    let all = Vec::<f64>::try_from(&probabilities).unwrap();
    let top = imagenet::top_k(&probabilities, 5).unwrap();
    assert_eq!(top.len(), 5);

    let mut indexes: Vec<i64> = top.iter().map(|&(_, i)| i).collect();
    indexes.sort();
    indexes.dedup();
    assert_eq!(indexes.len(), 5);

    let min_selected = top.iter().map(|&(p, _)| p).fold(f64::INFINITY, f64::min);
    for (i, &p) in all.iter().enumerate() {
        if !indexes.contains(&(i as i64)) {
            assert!(p <= min_selected, "{i}: {p} > {min_selected}");
        }
    }
    for pair in top.windows(2) {
        assert!(pair[0].0 >= pair[1].0);
    }
    for &(p, i) in top.iter() {
        assert_eq!(p, all[i as usize]);
    }
}

#[test]
fn top_k_accepts_batched_vector() {
    let probabilities = Tensor::from_slice(&[0.1f32, 0.6, 0.3]).view([1, 3]);
    let top = imagenet::top_k(&probabilities, 2).unwrap();
    let indexes: Vec<i64> = top.iter().map(|&(_, i)| i).collect();
    assert_eq!(indexes, [1, 2]);
    assert!(imagenet::top_k(&probabilities, 4).is_err());
    assert!(imagenet::top_k(&Tensor::zeros([2, 3], tch::kind::FLOAT_CPU), 1).is_err());
}

#[test]
fn predictions_use_category_names() {
    let probabilities = Tensor::from_slice(&[0.125f32, 0.625, 0.25]);
    let categories = Categories::Loaded(vec!["tench".into(), "goldfish".into()]);
    let predictions = imagenet::predictions(&probabilities, &categories, 3).unwrap();
    let labels: Vec<&str> = predictions.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, ["goldfish", "class_2", "tench"]);
    assert_eq!(predictions[0].to_string(), "goldfish 0.625");
}

#[test]
fn report_lines() {
    let probabilities = Tensor::from_slice(&[0.125f32, 0.625, 0.25]);
    let categories = Categories::Loaded(vec!["tench".into(), "goldfish".into(), "shark".into()]);
    let mut out = Vec::new();
    imagenet::report(&mut out, &probabilities, &categories, Path::new("labels.txt"), 2).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "[3]\nLoaded 3 ImageNet categories from labels.txt\ngoldfish 0.625\nshark 0.25\n"
    );

    let categories = Categories::Fallback(imagenet::synthetic_categories(3));
    let mut out = Vec::new();
    imagenet::report(&mut out, &probabilities, &categories, Path::new("labels.txt"), 1).unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "[3]\nlabels.txt not found. Please ensure the file is in the current directory.\n\
         class_1 0.625\n"
    );

    // An invalid k is reported before anything is written.
    let mut out = Vec::new();
    assert!(imagenet::report(&mut out, &probabilities, &categories, Path::new("x"), 0).is_err());
    assert!(out.is_empty());
}
