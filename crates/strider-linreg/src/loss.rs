// Mean squared error
//
//   mse = mean((prediction - target)²)
//
// computed with the engine's own primitives: broadcast `sub`, the
// self-product through `mul`, then a full reduction.

use strider_core::{Error, Result, Tensor};

/// Mean squared error between two tensors of identical shape.
///
/// Shapes must match exactly; `[n, 1]` against `[n]` would otherwise
/// broadcast to `[n, n]` and silently compute the wrong quantity.
///
/// # Example
/// ```
/// use strider_core::{DType, Tensor};
/// use strider_linreg::mse_loss;
///
/// let pred = Tensor::from_f64_slice(&[1.0, 2.0, 3.0], (3, 1), DType::F64)?;
/// let y = Tensor::full((3, 1), 1.0, DType::F64)?;
/// assert!((mse_loss(&pred, &y)? - 5.0 / 3.0).abs() < 1e-12);
/// # Ok::<(), strider_core::Error>(())
/// ```
pub fn mse_loss(prediction: &Tensor, target: &Tensor) -> Result<f64> {
    if prediction.shape() != target.shape() {
        return Err(Error::ShapeMismatch {
            expected: prediction.shape().clone(),
            got: target.shape().clone(),
        });
    }
    let diff = prediction.sub(target)?;
    let squared = diff.mul(&diff)?;
    Ok(squared.mean())
}
