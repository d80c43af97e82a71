// Column sources — the boundary to whatever loads the data
//
// File parsing lives outside this crate. A loader hands over two equal-length
// numeric columns (one feature, one target); `columns_to_tensors` turns them
// into the [n, 1] tensors the trainer consumes, filling them index by index.

use strider_core::{DType, Error, Result, Shape, Tensor};

/// A source of one feature column and one target column.
pub trait ColumnSource {
    /// The feature values, one per sample.
    fn features(&self) -> &[f64];

    /// The target values, one per sample.
    fn targets(&self) -> &[f64];

    /// Number of samples.
    fn len(&self) -> usize {
        self.features().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory pair of columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPair {
    features: Vec<f64>,
    targets: Vec<f64>,
}

impl ColumnPair {
    /// Pair two columns. Fails if their lengths differ.
    pub fn new(features: Vec<f64>, targets: Vec<f64>) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(Error::ShapeMismatch {
                expected: Shape::from(features.len()),
                got: Shape::from(targets.len()),
            });
        }
        Ok(Self { features, targets })
    }

    /// Build both columns from `f(x)` over the given feature values.
    pub fn from_fn(features: Vec<f64>, f: impl Fn(f64) -> f64) -> Self {
        let targets = features.iter().map(|&x| f(x)).collect();
        Self { features, targets }
    }
}

impl ColumnSource for ColumnPair {
    fn features(&self) -> &[f64] {
        &self.features
    }

    fn targets(&self) -> &[f64] {
        &self.targets
    }
}

/// Build `(X, y)`, both shaped `[n, 1]`, from a column source.
pub fn columns_to_tensors<S: ColumnSource + ?Sized>(
    source: &S,
    dtype: DType,
) -> Result<(Tensor, Tensor)> {
    let (xs, ys) = (source.features(), source.targets());
    if xs.len() != ys.len() {
        return Err(Error::ShapeMismatch {
            expected: Shape::from(xs.len()),
            got: Shape::from(ys.len()),
        });
    }
    let n = xs.len();
    let mut x = Tensor::zeros((n, 1), dtype)?;
    let mut y = Tensor::zeros((n, 1), dtype)?;
    for (i, (&xv, &yv)) in xs.iter().zip(ys).enumerate() {
        x.set(&[i, 0], xv)?;
        y.set(&[i, 0], yv)?;
    }
    log::debug!("loaded {} samples as {} tensors", n, dtype);
    Ok((x, y))
}
