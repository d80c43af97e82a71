//! # Strider
//!
//! A minimal tensor engine with a linear-regression trainer.
//!
//! This is the top-level facade crate that re-exports everything you need.
//!
//! ## Usage
//!
//! ```rust
//! use strider::prelude::*;
//!
//! let a = Tensor::from_f64_slice(&[1.0, 2.0, 3.0], (3, 1), DType::F64)?;
//! let b = Tensor::from_f64_slice(&[10.0, 20.0], (1, 2), DType::F64)?;
//! let c = a.add(&b)?;
//! assert_eq!(c.dims(), &[3, 2]);
//! # Ok::<(), strider::Error>(())
//! ```
//!
//! ## Architecture
//!
//! | Crate | Purpose |
//! |-------|----------|
//! | `strider-core` | Tensor, Shape, DType, Layout, Storage, broadcasting, matmul |
//! | `strider-linreg` | MSE loss, linear model, gradient-descent trainer |

/// Re-export core types.
pub use strider_core::{
    live_buffers, BinaryOp, DType, Error, ErrorKind, Layout, Result, Role, Shape, Storage, Tensor,
    WithDType,
};

/// Re-export the regression trainer.
pub mod linreg {
    pub use strider_linreg::*;
}

/// Prelude: import this for the most common types.
pub mod prelude {
    pub use crate::linreg::{
        columns_to_tensors, linear_forward, mse_loss, train_linear_regression, ColumnPair,
        ColumnSource, EpochLog, LinearRegression, TrainConfig, TrainHistory,
    };
    pub use crate::{DType, Error, ErrorKind, Result, Role, Shape, Tensor};
}
