//! # strider-linreg
//!
//! Ordinary least-squares regression trained by full-batch gradient descent
//! on strider tensors.
//!
//! 1. **Config** — [`TrainConfig`]: learning rate, epoch count, verbosity
//! 2. **Loss** — [`mse_loss`]: mean squared error over equal-shaped tensors
//! 3. **Model** — [`linear_forward`] and the [`LinearRegression`] wrapper
//! 4. **Trainer** — [`train_linear_regression`], returning a [`TrainHistory`]
//! 5. **Sources** — [`ColumnSource`] and [`columns_to_tensors`] for loaded data
//!
//! Progress is reported through the `log` facade at `info` level when
//! `verbose` is set; install any logger to see it.

pub mod config;
pub mod loss;
pub mod model;
pub mod source;
pub mod trainer;

pub use config::TrainConfig;
pub use loss::mse_loss;
pub use model::{linear_forward, LinearRegression};
pub use source::{columns_to_tensors, ColumnPair, ColumnSource};
pub use trainer::{train_linear_regression, EpochLog, TrainHistory};
