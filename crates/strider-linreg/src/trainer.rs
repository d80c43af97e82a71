// Trainer — full-batch gradient descent on MSE
//
// Given X [n, d], y [n, 1], W [d, 1] and b [1], every epoch runs:
//
//   1. Forward:  pred = X @ W + b                         [n, 1]
//   2. Loss:     mse  = mean((pred - y)²)                 (reported only)
//   3. Gradient: diff = pred - y                          [n, 1]
//                grad_b = (2/n) * sum(diff)
//                grad_W = (2/n) * Xᵀ @ diff               [d, 1]
//                (Xᵀ is materialized as a [d, n] copy each epoch)
//   4. Update:   W -= lr * grad_W,  b -= lr * grad_b      (in place)
//
// The epoch count is the only stopping condition. The prediction, diff,
// transposed X and raw weight gradient are dropped at the end of each epoch.

use std::fmt;

use strider_core::{bail, Error, Result, Shape, Tensor};

use crate::config::TrainConfig;
use crate::loss::mse_loss;
use crate::model::{check_params, linear_forward};

/// Loss observed at one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochLog {
    /// Epoch number (0-indexed).
    pub epoch: usize,
    /// MSE computed from the parameters at the start of the epoch.
    pub loss: f64,
}

/// Summary of a full training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainHistory {
    /// Every epoch, in order.
    pub epochs: Vec<EpochLog>,
    /// The epochs reported under verbose mode (empty when not verbose).
    pub reported: Vec<EpochLog>,
}

impl TrainHistory {
    /// Loss of the last epoch, if any epoch ran.
    pub fn final_loss(&self) -> Option<f64> {
        self.epochs.last().map(|log| log.loss)
    }

    /// Per-epoch losses in order.
    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|log| log.loss).collect()
    }
}

impl fmt::Display for TrainHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Training complete: {} epochs", self.epochs.len())?;
        for log in &self.reported {
            write!(f, "\n  epoch {}: loss = {:.6}", log.epoch, log.loss)?;
        }
        if let Some(loss) = self.final_loss() {
            write!(f, "\n  final loss: {:.6}", loss)?;
        }
        Ok(())
    }
}

/// Validate every shape up front; returns `n`.
fn check_shapes(x: &Tensor, y: &Tensor, weight: &Tensor, bias: &Tensor) -> Result<usize> {
    if x.rank() != 2 {
        return Err(Error::RankMismatch {
            op: "train_linear_regression",
            expected: 2,
            got: x.rank(),
        });
    }
    let (n, d) = (x.dims()[0], x.dims()[1]);
    if n == 0 {
        bail!("cannot train on an empty dataset");
    }
    if y.dims() != &[n, 1] {
        return Err(Error::ShapeMismatch {
            expected: Shape::from((n, 1)),
            got: y.shape().clone(),
        });
    }
    let wd = check_params(weight, bias)?;
    if wd != d {
        return Err(Error::ShapeMismatch {
            expected: Shape::from((d, 1)),
            got: weight.shape().clone(),
        });
    }
    Ok(n)
}

/// Train `y ≈ X @ W + b` in place with batch gradient descent.
///
/// `weight` and `bias` are updated every epoch; `x` and `y` are only read.
/// All shapes and the config are checked before the first update, so an
/// invalid call leaves the parameters untouched.
pub fn train_linear_regression(
    x: &Tensor,
    y: &Tensor,
    weight: &mut Tensor,
    bias: &mut Tensor,
    config: &TrainConfig,
) -> Result<TrainHistory> {
    config.validate()?;
    let n = check_shapes(x, y, weight, bias)?;

    let scale = 2.0 / n as f64;
    let lr = config.learning_rate;
    let mut history = TrainHistory {
        epochs: Vec::with_capacity(config.epochs),
        reported: Vec::new(),
    };

    for epoch in 0..config.epochs {
        let pred = linear_forward(x, weight, bias)?;
        let loss = mse_loss(&pred, y)?;

        let diff = pred.sub(y)?;
        let grad_b = scale * diff.sum();

        let x_t = x.transpose()?;
        let mut grad_w = x_t.matmul(&diff)?;
        grad_w.scale_inplace(scale);

        weight.sub_scaled_inplace(&grad_w, lr)?;
        bias.map_inplace(|b| b - lr * grad_b);

        let log = EpochLog { epoch, loss };
        history.epochs.push(log);
        if config.verbose && config.is_report_epoch(epoch) {
            log::info!("Epoch {}, Loss = {:.6}", epoch, loss);
            history.reported.push(log);
        }
    }

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strider_core::DType;

    fn line_data() -> (Tensor, Tensor) {
        let xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| 2.0 * x + 1.0).collect();
        let x = Tensor::from_f64_slice(&xs, (10, 1), DType::F64).unwrap();
        let y = Tensor::from_f64_slice(&ys, (10, 1), DType::F64).unwrap();
        (x, y)
    }

    #[test]
    fn test_single_step_matches_hand_computation() {
        // X = [1, 2], y = [1, 2], W = 0, b = 0
        // diff = [-1, -2]; grad_b = (2/2)(-3) = -3; grad_w = (2/2)(1*-1 + 2*-2) = -5
        let x = Tensor::from_f64_slice(&[1.0, 2.0], (2, 1), DType::F64).unwrap();
        let y = Tensor::from_f64_slice(&[1.0, 2.0], (2, 1), DType::F64).unwrap();
        let mut w = Tensor::zeros((1, 1), DType::F64).unwrap();
        let mut b = Tensor::zeros(1, DType::F64).unwrap();
        let cfg = TrainConfig::default().learning_rate(0.1).epochs(1);
        let history = train_linear_regression(&x, &y, &mut w, &mut b, &cfg).unwrap();

        assert!((w.get(&[0, 0]).unwrap() - 0.5).abs() < 1e-12);
        assert!((b.get(&[0]).unwrap() - 0.3).abs() < 1e-12);
        assert_eq!(history.epochs.len(), 1);
        assert!((history.final_loss().unwrap() - 2.5).abs() < 1e-12);
        assert!(history.reported.is_empty());
    }

    #[test]
    fn test_zero_epochs_leaves_params() {
        let (x, y) = line_data();
        let mut w = Tensor::full((1, 1), 0.25, DType::F64).unwrap();
        let mut b = Tensor::zeros(1, DType::F64).unwrap();
        let cfg = TrainConfig::default().epochs(0);
        let history = train_linear_regression(&x, &y, &mut w, &mut b, &cfg).unwrap();
        assert!(history.epochs.is_empty());
        assert_eq!(history.final_loss(), None);
        assert_eq!(w.get(&[0, 0]).unwrap(), 0.25);
    }

    #[test]
    fn test_shape_errors_do_not_mutate() {
        let (x, _) = line_data();
        let bad_y = Tensor::zeros((9, 1), DType::F64).unwrap();
        let mut w = Tensor::full((1, 1), 3.0, DType::F64).unwrap();
        let mut b = Tensor::full(1, 4.0, DType::F64).unwrap();
        let cfg = TrainConfig::default().epochs(5);
        let err = train_linear_regression(&x, &bad_y, &mut w, &mut b, &cfg).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert_eq!(w.get(&[0, 0]).unwrap(), 3.0);
        assert_eq!(b.get(&[0]).unwrap(), 4.0);

        let (x, y) = line_data();
        let mut wide_w = Tensor::zeros((2, 1), DType::F64).unwrap();
        assert!(train_linear_regression(&x, &y, &mut wide_w, &mut b, &cfg).is_err());
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let x = Tensor::zeros((0, 1), DType::F64).unwrap();
        let y = Tensor::zeros((0, 1), DType::F64).unwrap();
        let mut w = Tensor::zeros((1, 1), DType::F64).unwrap();
        let mut b = Tensor::zeros(1, DType::F64).unwrap();
        let err = train_linear_regression(&x, &y, &mut w, &mut b, &TrainConfig::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot train on an empty dataset");
    }

    #[test]
    fn test_verbose_reports_on_cadence() {
        let (x, y) = line_data();
        let mut w = Tensor::zeros((1, 1), DType::F64).unwrap();
        let mut b = Tensor::zeros(1, DType::F64).unwrap();
        let cfg = TrainConfig::default()
            .learning_rate(0.01)
            .epochs(250)
            .verbose(true);
        let history = train_linear_regression(&x, &y, &mut w, &mut b, &cfg).unwrap();
        let reported: Vec<usize> = history.reported.iter().map(|l| l.epoch).collect();
        assert_eq!(reported, vec![0, 100, 200, 249]);
        assert_eq!(history.reported[1], history.epochs[100]);
        assert!(history.to_string().contains("epoch 249"));
    }

    #[test]
    fn test_no_buffers_leak_across_epochs() {
        let (x, y) = line_data();
        let mut w = Tensor::zeros((1, 1), DType::F64).unwrap();
        let mut b = Tensor::zeros(1, DType::F64).unwrap();
        let before = strider_core::live_buffers();
        let cfg = TrainConfig::default().epochs(20);
        train_linear_regression(&x, &y, &mut w, &mut b, &cfg).unwrap();
        assert_eq!(strider_core::live_buffers(), before);
    }
}
