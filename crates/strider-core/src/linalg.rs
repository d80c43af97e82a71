use crate::error::{Error, Result};
use crate::shape::Shape;
use crate::tensor::Tensor;

// Linear algebra
//
// Both routines read operands through their strides and offsets and compute
// every product in f64. matmul is the direct triple loop,
//
//   out[i, j] = sum_k A[i, k] * B[k, j]
//
// O(M·K·N) scalar multiply-adds with no blocking. Each output element is
// rounded to the output dtype (A's dtype) once, after its sum is complete.

impl Tensor {
    /// Dot product of two rank-1 tensors of equal length.
    pub fn dot(&self, rhs: &Tensor) -> Result<f64> {
        for t in [self, rhs] {
            if t.rank() != 1 {
                return Err(Error::RankMismatch {
                    op: "dot",
                    expected: 1,
                    got: t.rank(),
                });
            }
        }
        if self.dims() != rhs.dims() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().clone(),
                got: rhs.shape().clone(),
            });
        }
        let total: f64 = self.storage().with(|a| {
            rhs.storage().with(|b| {
                self.layout()
                    .strided_indices()
                    .zip(rhs.layout().strided_indices())
                    .map(|(ia, ib)| a.read(ia) * b.read(ib))
                    .sum()
            })
        });
        Ok(total)
    }

    /// Naive 2-D matrix multiplication: [M, K] @ [K, N] → [M, N].
    pub fn matmul(&self, rhs: &Tensor) -> Result<Tensor> {
        for t in [self, rhs] {
            if t.rank() != 2 {
                return Err(Error::RankMismatch {
                    op: "matmul",
                    expected: 2,
                    got: t.rank(),
                });
            }
        }
        let (m, k1) = (self.dims()[0], self.dims()[1]);
        let (k2, n) = (rhs.dims()[0], rhs.dims()[1]);
        if k1 != k2 {
            let err = Error::MatmulShapeMismatch { m, k1, k2, n };
            log::debug!("{}", err);
            return Err(err);
        }

        let out = Tensor::zeros(Shape::from((m, n)), self.dtype())?;
        let (a_s0, a_s1) = (self.strides()[0], self.strides()[1]);
        let (b_s0, b_s1) = (rhs.strides()[0], rhs.strides()[1]);
        let (a_off, b_off) = (self.offset(), rhs.offset());

        self.storage().with(|a| {
            rhs.storage().with(|b| {
                out.storage().with_mut(|o| {
                    for i in 0..m {
                        for j in 0..n {
                            let mut acc = 0.0f64;
                            for k in 0..k1 {
                                let va = a.read(a_off + i * a_s0 + k * a_s1);
                                let vb = b.read(b_off + k * b_s0 + j * b_s1);
                                acc += va * vb;
                            }
                            o.write(i * n + j, acc);
                        }
                    }
                })
            })
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::{DType, Error, Tensor};

    #[test]
    fn test_matmul_2x2() {
        let a = Tensor::from_f64_slice(&[1.0, 2.0, 3.0, 4.0], (2, 2), DType::F64).unwrap();
        let b = Tensor::from_f64_slice(&[5.0, 6.0, 7.0, 8.0], (2, 2), DType::F64).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.dims(), &[2, 2]);
        assert_eq!(c.to_f64_vec(), vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_rectangular() {
        // [2,3] @ [3,1]
        let a = Tensor::from_f64_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3), DType::F64)
            .unwrap();
        let b = Tensor::from_f64_slice(&[1.0, 0.0, -1.0], (3, 1), DType::F64).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.dims(), &[2, 1]);
        assert_eq!(c.to_f64_vec(), vec![-2.0, -2.0]);
    }

    #[test]
    fn test_matmul_errors() {
        let a = Tensor::zeros((2, 3), DType::F64).unwrap();
        let b = Tensor::zeros((2, 3), DType::F64).unwrap();
        assert!(matches!(
            a.matmul(&b),
            Err(Error::MatmulShapeMismatch { m: 2, k1: 3, k2: 2, n: 3 })
        ));
        let v = Tensor::zeros(3, DType::F64).unwrap();
        assert!(matches!(a.matmul(&v), Err(Error::RankMismatch { .. })));
    }

    #[test]
    fn test_matmul_over_view() {
        // top-left [2,2] block of a [3,3] matrix
        let m = Tensor::from_f64_slice(
            &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0],
            (3, 3),
            DType::F64,
        )
        .unwrap();
        let block = m.slice(&[0, 0], &[2, 2]).unwrap();
        let eye = Tensor::from_f64_slice(&[1.0, 0.0, 0.0, 1.0], (2, 2), DType::F64).unwrap();
        assert_eq!(
            block.matmul(&eye).unwrap().to_f64_vec(),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_matmul_takes_left_dtype() {
        let a = Tensor::from_f64_slice(&[1.0, 1.0], (1, 2), DType::I32).unwrap();
        let b = Tensor::from_f64_slice(&[0.75, 0.75], (2, 1), DType::F64).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.dtype(), DType::I32);
        // 1.5 summed in f64, truncated once on write
        assert_eq!(c.to_f64_vec(), vec![1.0]);
    }

    #[test]
    fn test_dot() {
        let a = Tensor::from_f64_slice(&[1.0, 2.0, 3.0], 3, DType::F64).unwrap();
        let b = Tensor::from_f64_slice(&[4.0, 5.0, 6.0], 3, DType::F32).unwrap();
        assert_eq!(a.dot(&b).unwrap(), 32.0);

        let short = Tensor::zeros(2, DType::F64).unwrap();
        assert!(matches!(a.dot(&short), Err(Error::ShapeMismatch { .. })));
        let m = Tensor::zeros((3, 1), DType::F64).unwrap();
        assert!(matches!(a.dot(&m), Err(Error::RankMismatch { .. })));
    }
}
