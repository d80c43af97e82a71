use std::fmt;

use crate::error::{Error, Result};

// Shape — ordered dimension sizes
//
//   - Scalar: Shape([])      — 0 dimensions, 1 element
//   - Vector: Shape([5])     — 1 dimension, 5 elements
//   - Matrix: Shape([3, 4])  — 2 dimensions, 12 elements
//   - Empty:  Shape([3, 0])  — 2 dimensions, 0 elements
//
// Rank is not bounded; dims live in a Vec.

/// N-dimensional shape of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Create a new shape from a vector of dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    /// The dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions (0 for scalar, 1 for vector, 2 for matrix, etc.).
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements (product of all dimensions).
    /// A scalar shape [] has 1 element; any zero-sized dim gives 0.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// Like [`elem_count`](Self::elem_count) but `None` on overflow.
    pub fn checked_elem_count(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Compute the contiguous (row-major / C-order) strides for this shape.
    ///
    /// For shape [2, 3, 4], strides are [12, 4, 1]: the last dimension
    /// always has stride 1.
    pub fn stride_contiguous(&self) -> Vec<usize> {
        let mut strides = vec![0usize; self.rank()];
        if self.rank() > 0 {
            strides[self.rank() - 1] = 1;
            for i in (0..self.rank() - 1).rev() {
                strides[i] = strides[i + 1] * self.0[i + 1];
            }
        }
        strides
    }

    /// Like [`stride_contiguous`](Self::stride_contiguous) but `None` if a
    /// stride overflows. A zero-sized dim keeps the element count at 0, so
    /// `[0, usize::MAX, 2]` passes `checked_elem_count` yet has no valid strides.
    pub fn checked_stride_contiguous(&self) -> Option<Vec<usize>> {
        let mut strides = vec![1usize; self.rank()];
        for i in (0..self.rank().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1].checked_mul(self.0[i + 1])?;
        }
        Some(strides)
    }

    // Broadcasting

    /// Compute the broadcast output shape from two input shapes.
    ///
    ///   1. Align shapes from the right (trailing dimensions).
    ///   2. Dimensions are compatible if they are equal or one of them is 1.
    ///   3. Missing leading dimensions are treated as 1.
    ///   4. The output dimension is the non-1 side of the pair, so a size-1
    ///      dimension stretches to 0 as well: [0] and [1] → [0].
    ///
    /// Examples:
    ///   [3, 1] and [1, 4]    → [3, 4]
    ///   [5, 3, 1] and [3, 4] → [5, 3, 4]
    ///   [0, 3] and [1, 3]    → [0, 3]
    ///   [3, 2] and [4, 2]    → Error (3 ≠ 4 and neither is 1)
    pub fn broadcast_shape(lhs: &Shape, rhs: &Shape) -> Result<Shape> {
        let l = lhs.dims();
        let r = rhs.dims();
        let max_rank = l.len().max(r.len());
        let mut result = Vec::with_capacity(max_rank);

        for i in 0..max_rank {
            let ld = if i < l.len() { l[l.len() - 1 - i] } else { 1 };
            let rd = if i < r.len() { r[r.len() - 1 - i] } else { 1 };

            let out = if ld == rd || rd == 1 {
                ld
            } else if ld == 1 {
                rd
            } else {
                return Err(Error::BroadcastMismatch {
                    lhs: lhs.clone(),
                    rhs: rhs.clone(),
                    dim: i,
                    ld,
                    rd,
                });
            };
            result.push(out);
        }

        result.reverse(); // built from the right
        Ok(Shape::new(result))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// These let you write: Shape::from((3, 4)) instead of Shape::new(vec![3, 4])

impl From<()> for Shape {
    /// Scalar shape (0 dimensions).
    fn from(_: ()) -> Self {
        Shape(vec![])
    }
}

impl From<usize> for Shape {
    /// 1-D shape.
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

impl From<(usize,)> for Shape {
    fn from((d0,): (usize,)) -> Self {
        Shape(vec![d0])
    }
}

impl From<(usize, usize)> for Shape {
    fn from((d0, d1): (usize, usize)) -> Self {
        Shape(vec![d0, d1])
    }
}

impl From<(usize, usize, usize)> for Shape {
    fn from((d0, d1, d2): (usize, usize, usize)) -> Self {
        Shape(vec![d0, d1, d2])
    }
}

impl From<Vec<usize>> for Shape {
    fn from(v: Vec<usize>) -> Self {
        Shape(v)
    }
}

impl From<&[usize]> for Shape {
    fn from(s: &[usize]) -> Self {
        Shape(s.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(a: [usize; N]) -> Self {
        Shape(a.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_shape() {
        let s = Shape::from(());
        assert_eq!(s.rank(), 0);
        assert_eq!(s.elem_count(), 1);
        assert_eq!(s.stride_contiguous(), Vec::<usize>::new());
    }

    #[test]
    fn test_empty_shape_has_no_elements() {
        let s = Shape::from((3, 0));
        assert_eq!(s.elem_count(), 0);
        assert_eq!(s.stride_contiguous(), vec![0, 1]);
    }

    #[test]
    fn test_3d_strides() {
        let s = Shape::from((2, 3, 4));
        assert_eq!(s.stride_contiguous(), vec![12, 4, 1]);
        assert_eq!(s.elem_count(), 24);
    }

    #[test]
    fn test_checked_elem_count_overflow() {
        let s = Shape::from((usize::MAX, 2));
        assert_eq!(s.checked_elem_count(), None);
        assert_eq!(Shape::from((4, 5)).checked_elem_count(), Some(20));
    }

    #[test]
    fn test_broadcast_compatible() {
        let out = Shape::broadcast_shape(&Shape::from((3, 1)), &Shape::from((1, 4))).unwrap();
        assert_eq!(out.dims(), &[3, 4]);

        let out = Shape::broadcast_shape(&Shape::from((5, 3, 1)), &Shape::from((3, 4))).unwrap();
        assert_eq!(out.dims(), &[5, 3, 4]);

        let out = Shape::broadcast_shape(&Shape::from((10, 1)), &Shape::from(1)).unwrap();
        assert_eq!(out.dims(), &[10, 1]);
    }

    #[test]
    fn test_broadcast_size_one_stretches_to_zero() {
        let out = Shape::broadcast_shape(&Shape::from(0), &Shape::from(1)).unwrap();
        assert_eq!(out.dims(), &[0]);

        let out = Shape::broadcast_shape(&Shape::from((1, 3)), &Shape::from((0, 1))).unwrap();
        assert_eq!(out.dims(), &[0, 3]);

        assert!(Shape::broadcast_shape(&Shape::from(0), &Shape::from(2)).is_err());
    }

    #[test]
    fn test_checked_strides_overflow() {
        let s = Shape::from((0, usize::MAX, 2));
        assert_eq!(s.checked_elem_count(), Some(0));
        assert_eq!(s.checked_stride_contiguous(), None);
        assert_eq!(
            Shape::from((2, 3, 4)).checked_stride_contiguous(),
            Some(vec![12, 4, 1])
        );
        assert_eq!(Shape::from(()).checked_stride_contiguous(), Some(vec![]));
    }

    #[test]
    fn test_broadcast_incompatible() {
        let err = Shape::broadcast_shape(&Shape::from((3, 2)), &Shape::from((4, 2))).unwrap_err();
        match err {
            Error::BroadcastMismatch { dim, ld, rd, .. } => {
                assert_eq!((dim, ld, rd), (1, 3, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_display() {
        let s = Shape::from((3, 4));
        assert_eq!(format!("{}", s), "[3, 4]");
    }
}
