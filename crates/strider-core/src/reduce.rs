use crate::tensor::Tensor;

// Reductions over all elements
//
// Accumulation is in f64 regardless of dtype and walks the logical elements
// in row-major order through the tensor's strides, so views reduce over
// exactly the elements they expose.

impl Tensor {
    /// Sum of all elements.
    pub fn sum(&self) -> f64 {
        self.storage().with(|buf| {
            self.layout()
                .strided_indices()
                .map(|idx| buf.read(idx))
                .sum()
        })
    }

    /// Mean of all elements. An empty tensor has mean 0.
    pub fn mean(&self) -> f64 {
        let n = self.elem_count();
        if n == 0 {
            return 0.0;
        }
        self.sum() / n as f64
    }
}
