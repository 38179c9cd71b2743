//! ImageNet labels and top-k helpers.
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use tch::Tensor;

use crate::{ClassifyError, Result};

pub const CLASS_COUNT: i64 = 1000;

/// Default location of the label file, relative to the working directory.
pub const CATEGORIES_FILE: &str = "imagenet_classes.txt";

/// Category names, index i naming class i.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Categories {
    /// Read from a label file.
    Loaded(Vec<String>),
    /// Placeholder names used when the label file does not exist.
    Fallback(Vec<String>),
}

impl Categories {
    pub fn names(&self) -> &[String] {
        match self {
            Categories::Loaded(names) | Categories::Fallback(names) => names,
        }
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Categories::Fallback(_))
    }

    /// The name for class `index`, `class_<index>` if the list is too short.
    pub fn name(&self, index: i64) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.names().get(i))
            .cloned()
            .unwrap_or_else(|| format!("class_{index}"))
    }
}

/// `class_0`, `class_1`, ..., `class_{n-1}`.
pub fn synthetic_categories(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("class_{i}")).collect()
}

/// Reads one category name per line, trimming surrounding whitespace.
///
/// A missing file is not an error: the synthetic `class_<i>` names are
/// returned instead so that predictions can still be reported by index.
/// Other I/O errors are propagated.
pub fn load_categories<T: AsRef<Path>>(path: T) -> Result<Categories> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(?path, "label file not found, using synthetic category names");
            return Ok(Categories::Fallback(synthetic_categories(CLASS_COUNT as usize)));
        }
        Err(err) => return Err(ClassifyError::Io(err).path_context(path)),
    };
    let names = BufReader::new(file)
        .lines()
        .map(|line| line.map(|l| l.trim().to_string()))
        .collect::<io::Result<Vec<_>>>()
        .map_err(|err| ClassifyError::Io(err).path_context(path))?;
    tracing::debug!(?path, count = names.len(), "loaded categories");
    Ok(Categories::Loaded(names))
}

/// Flattens `[n]`, `[1, n]` or `[1, 1, n]` to `[n]`.
fn as_vector(tensor: &Tensor) -> Result<Tensor> {
    match tensor.size().as_slice() {
        [_] => Ok(tensor.shallow_clone()),
        [1, n] | [1, 1, n] => Ok(tensor.view([*n])),
        size => {
            Err(ClassifyError::Shape(format!("expected a probability vector, got {size:?}")))
        }
    }
}

/// Returns the `k` largest values and their indexes, largest first.
pub fn top_k(probabilities: &Tensor, k: i64) -> Result<Vec<(f64, i64)>> {
    let tensor = as_vector(probabilities)?;
    let n = tensor.size()[0];
    if k <= 0 || k > n {
        return Err(ClassifyError::Config(format!("top-k expects 1 <= k <= {n}, got {k}")));
    }
    let (values, indexes) = tensor.f_topk(k, 0, true, true)?;
    let values = Vec::<f64>::try_from(&values)?;
    let indexes = Vec::<i64>::try_from(&indexes)?;
    Ok(values.into_iter().zip(indexes).collect())
}

/// A single reported class.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
    pub index: i64,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.label, self.probability)
    }
}

/// The `k` most likely classes with their names.
pub fn predictions(
    probabilities: &Tensor,
    categories: &Categories,
    k: i64,
) -> Result<Vec<Prediction>> {
    Ok(top_k(probabilities, k)?
        .into_iter()
        .map(|(probability, index)| {
            Prediction { label: categories.name(index), probability, index }
        })
        .collect())
}

/// Writes the shape of `probabilities`, where the category names came from
/// and then one `<label> <probability>` line per prediction.
pub fn report<W: Write>(
    out: &mut W,
    probabilities: &Tensor,
    categories: &Categories,
    labels_path: &Path,
    k: i64,
) -> Result<()> {
    let predictions = predictions(probabilities, categories, k)?;
    writeln!(out, "{:?}", probabilities.size())?;
    if categories.is_fallback() {
        writeln!(
            out,
            "{} not found. Please ensure the file is in the current directory.",
            labels_path.display()
        )?;
    } else {
        writeln!(
            out,
            "Loaded {} ImageNet categories from {}",
            categories.len(),
            labels_path.display()
        )?;
    }
    for prediction in predictions.iter() {
        writeln!(out, "{prediction}")?;
    }
    Ok(())
}
