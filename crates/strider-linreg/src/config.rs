// TrainConfig — hyper-parameters for batch gradient descent
//
// Training always runs exactly `epochs` full-batch updates. There is no
// early stopping and no convergence check.

use strider_core::{bail, Result};

/// Configuration for [`train_linear_regression`](crate::train_linear_regression).
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Step size applied to both gradients.
    pub learning_rate: f64,
    /// Number of full-batch updates.
    pub epochs: usize,
    /// Whether to log `(epoch, loss)` at the report cadence.
    pub verbose: bool,
    /// Report every n-th epoch (the final epoch is always reported).
    pub report_every: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            epochs: 1000,
            verbose: false,
            report_every: 100,
        }
    }
}

impl TrainConfig {
    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn epochs(mut self, n: usize) -> Self {
        self.epochs = n;
        self
    }

    pub fn verbose(mut self, v: bool) -> Self {
        self.verbose = v;
        self
    }

    pub fn report_every(mut self, n: usize) -> Self {
        self.report_every = n;
        self
    }

    /// Reject settings that would make training meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() {
            bail!("learning rate must be finite, got {}", self.learning_rate);
        }
        if self.report_every == 0 {
            bail!("report_every must be at least 1");
        }
        Ok(())
    }

    /// Whether `epoch` (0-indexed) falls on the report cadence.
    pub fn is_report_epoch(&self, epoch: usize) -> bool {
        epoch % self.report_every == 0 || epoch + 1 == self.epochs
    }
}
