use crate::error::Result;
use crate::layout::{Layout, StridedIter};
use crate::shape::Shape;
use crate::tensor::{Role, Tensor};

// Broadcasting engine
//
// An elementwise binary op runs in three steps:
//
//   1. Compute the broadcast shape (Shape::broadcast_shape). Any incompatible
//      dimension pair fails the whole op before anything is allocated. A
//      size-1 dimension stretches to the other side, including to 0, so
//      [0] with [1] is an empty [0] result.
//   2. Allocate a contiguous owner of that shape with the LEFT operand's dtype.
//   3. Walk every output coordinate once. Each operand is read through its
//      broadcast strides: a dimension it lacks, or holds at size 1 while the
//      output differs, has stride 0 and always reads index 0. Both reads are
//      canonical f64; the result is converted to the output dtype on write.
//
// Because operands are addressed through their own strides and offsets,
// slices and other non-contiguous views broadcast correctly.

/// Element-wise binary operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Apply the operator to two canonical values.
    ///
    /// `Div` follows IEEE-754: `x / 0.0` is ±inf and `0.0 / 0.0` is NaN.
    /// Writing such a value into an I32 tensor stores the saturated or
    /// zero integer produced by the f64 → i32 conversion.
    #[inline]
    pub fn apply(self, x: f64, y: f64) -> f64 {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        }
    }
}

fn operand_iter(layout: &Layout, out_shape: &Shape) -> StridedIter {
    StridedIter::new(
        out_shape.dims().to_vec(),
        layout.broadcast_strides(out_shape),
        layout.offset(),
    )
}

impl Tensor {
    /// Element-wise addition with broadcasting: self + rhs.
    pub fn add(&self, rhs: &Tensor) -> Result<Tensor> {
        self.binary_op(rhs, BinaryOp::Add)
    }

    /// Element-wise subtraction with broadcasting: self - rhs.
    pub fn sub(&self, rhs: &Tensor) -> Result<Tensor> {
        self.binary_op(rhs, BinaryOp::Sub)
    }

    /// Element-wise multiplication with broadcasting: self * rhs.
    pub fn mul(&self, rhs: &Tensor) -> Result<Tensor> {
        self.binary_op(rhs, BinaryOp::Mul)
    }

    /// Element-wise division with broadcasting: self / rhs.
    pub fn div(&self, rhs: &Tensor) -> Result<Tensor> {
        self.binary_op(rhs, BinaryOp::Div)
    }

    /// Apply `op` over the broadcast of `self` and `rhs`, producing a new owner.
    pub fn binary_op(&self, rhs: &Tensor, op: BinaryOp) -> Result<Tensor> {
        let out_shape = Shape::broadcast_shape(self.shape(), rhs.shape()).map_err(|e| {
            log::debug!("{}: {}", op.name(), e);
            e
        })?;
        let out = Tensor::zeros(out_shape.clone(), self.dtype())?;
        debug_assert_eq!(out.role(), Role::Owner);

        let lhs_idx = operand_iter(self.layout(), &out_shape);
        let rhs_idx = operand_iter(rhs.layout(), &out_shape);

        self.storage().with(|a| {
            rhs.storage().with(|b| {
                out.storage().with_mut(|o| {
                    for (i, (ia, ib)) in lhs_idx.zip(rhs_idx).enumerate() {
                        o.write(i, op.apply(a.read(ia), b.read(ib)));
                    }
                })
            })
        });
        Ok(out)
    }
}
