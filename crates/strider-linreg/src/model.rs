// Linear model — y = X @ W + b
//
// PARAMETER SHAPES:
//
//   weight: [d, 1]  — one coefficient per feature
//   bias:   [1]     — broadcast across all n rows
//
// COMPUTATION:
//
//   Input:  X [n, d]
//   Output:   [n, 1]

use strider_core::{DType, Error, Result, Shape, Tensor};

use crate::config::TrainConfig;
use crate::trainer::{train_linear_regression, TrainHistory};

/// Forward pass: `matmul(X, W)` followed by a broadcast add of `b`.
pub fn linear_forward(x: &Tensor, weight: &Tensor, bias: &Tensor) -> Result<Tensor> {
    let xw = x.matmul(weight)?;
    xw.add(bias)
}

/// Check that `weight` is `[d, 1]` and `bias` is `[1]`; returns `d`.
pub(crate) fn check_params(weight: &Tensor, bias: &Tensor) -> Result<usize> {
    if weight.rank() != 2 {
        return Err(Error::RankMismatch {
            op: "linear weight",
            expected: 2,
            got: weight.rank(),
        });
    }
    let d = weight.dims()[0];
    if weight.dims()[1] != 1 {
        return Err(Error::ShapeMismatch {
            expected: Shape::from((d, 1)),
            got: weight.shape().clone(),
        });
    }
    if bias.dims() != &[1] {
        return Err(Error::ShapeMismatch {
            expected: Shape::from(1),
            got: bias.shape().clone(),
        });
    }
    Ok(d)
}

/// A linear regressor owning its weight and bias tensors.
///
/// # Examples
/// ```
/// use strider_core::DType;
/// use strider_linreg::{columns_to_tensors, ColumnPair, LinearRegression, TrainConfig};
///
/// let data = ColumnPair::from_fn((0..10).map(|i| i as f64).collect(), |x| 2.0 * x + 1.0);
/// let (x, y) = columns_to_tensors(&data, DType::F64)?;
///
/// let mut model = LinearRegression::new(1, DType::F64)?;
/// let config = TrainConfig::default().learning_rate(0.02).epochs(5000);
/// model.fit(&x, &y, &config)?;
/// assert!((model.predict_one(4.0)? - 9.0).abs() < 0.1);
/// # Ok::<(), strider_core::Error>(())
/// ```
pub struct LinearRegression {
    weight: Tensor,
    bias: Tensor,
}

impl LinearRegression {
    /// Zero-initialized model for `features` input columns.
    pub fn new(features: usize, dtype: DType) -> Result<Self> {
        Ok(Self {
            weight: Tensor::zeros((features, 1), dtype)?,
            bias: Tensor::zeros(1, dtype)?,
        })
    }

    /// Wrap existing parameters after checking their shapes.
    pub fn from_params(weight: Tensor, bias: Tensor) -> Result<Self> {
        check_params(&weight, &bias)?;
        Ok(Self { weight, bias })
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> &Tensor {
        &self.bias
    }

    /// Number of input features `d`.
    pub fn features(&self) -> usize {
        self.weight.dims()[0]
    }

    /// Predictions for every row of `x` ([n, d] → [n, 1]).
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        linear_forward(x, &self.weight, &self.bias)
    }

    /// `w * x + b` for a single-feature model.
    pub fn predict_one(&self, x: f64) -> Result<f64> {
        if self.features() != 1 {
            return Err(Error::ShapeMismatch {
                expected: Shape::from((1, 1)),
                got: self.weight.shape().clone(),
            });
        }
        Ok(self.weight.get(&[0, 0])? * x + self.bias.get(&[0])?)
    }

    /// Train in place with batch gradient descent.
    pub fn fit(&mut self, x: &Tensor, y: &Tensor, config: &TrainConfig) -> Result<TrainHistory> {
        train_linear_regression(x, y, &mut self.weight, &mut self.bias, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_shape_and_values() {
        // X [3,2], W [2,1], b [1]
        let x = Tensor::from_f64_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (3, 2), DType::F64)
            .unwrap();
        let w = Tensor::from_f64_slice(&[1.0, -1.0], (2, 1), DType::F64).unwrap();
        let b = Tensor::full(1, 0.5, DType::F64).unwrap();
        let out = linear_forward(&x, &w, &b).unwrap();
        assert_eq!(out.dims(), &[3, 1]);
        assert_eq!(out.to_f64_vec(), vec![-0.5, -0.5, -0.5]);
    }

    #[test]
    fn test_from_params_checks_shapes() {
        let w = Tensor::zeros((2, 2), DType::F64).unwrap();
        let b = Tensor::zeros(1, DType::F64).unwrap();
        assert!(LinearRegression::from_params(w, b).is_err());

        let w = Tensor::zeros((2, 1), DType::F64).unwrap();
        let b = Tensor::zeros((1, 1), DType::F64).unwrap();
        assert!(LinearRegression::from_params(w, b).is_err());
    }

    #[test]
    fn test_predict_one() {
        let w = Tensor::full((1, 1), 2.0, DType::F64).unwrap();
        let b = Tensor::full(1, 1.0, DType::F64).unwrap();
        let model = LinearRegression::from_params(w, b).unwrap();
        assert_eq!(model.predict_one(3.0).unwrap(), 7.0);

        let wide = LinearRegression::new(2, DType::F64).unwrap();
        assert!(wide.predict_one(1.0).is_err());
    }
}
