use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout — Memory layout of a tensor (shape + strides + offset)
//
// The Layout decouples the *logical* shape of a tensor from how its data is
// arranged in the shared buffer.
//
// KEY CONCEPTS:
//
// 1. **Strides**: How many elements to skip in the flat buffer to move one
//    step along each dimension. A contiguous [2,3] matrix has strides [3,1].
//
// 2. **Slice**: Shape shrinks to `end - start` per dimension, strides are
//    inherited verbatim from the parent, and the offset moves forward by
//    `sum(start[i] * strides[i])`. A column slice is therefore
//    non-contiguous and must always be addressed through its strides.
//
// 3. **Contiguity**: strides match the row-major strides of the *current*
//    shape (size-1 dimensions may carry any stride). The offset does not
//    matter: a row slice of a matrix is contiguous, just not at offset 0.
//
// 4. **Broadcast strides**: when an operand is read under a larger broadcast
//    shape, every stretched or missing dimension gets stride 0 so that the
//    same element is revisited.

/// Layout describes how a tensor's logical shape maps to flat storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    /// Element offset into the buffer where this tensor's data starts.
    offset: usize,
}

impl Layout {
    /// Create a new contiguous layout for the given shape.
    pub fn contiguous(shape: Shape) -> Self {
        let strides = shape.stride_contiguous();
        Layout {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a layout with explicit strides and offset (for views).
    pub fn new(shape: Shape, strides: Vec<usize>, offset: usize) -> Self {
        debug_assert_eq!(shape.rank(), strides.len());
        Layout {
            shape,
            strides,
            offset,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Check if elements are laid out densely in row-major order.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1usize;
        for (&dim, &stride) in self.dims().iter().zip(self.strides.iter()).rev() {
            if dim == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= dim;
        }
        true
    }

    /// Slice every dimension to `[start[i], end[i])`.
    ///
    /// Requires `start[i] < end[i] <= dims[i]` for every dimension.
    pub fn slice(&self, start: &[usize], end: &[usize]) -> Result<Layout> {
        let rank = self.rank();
        if start.len() != rank || end.len() != rank {
            return Err(Error::RankMismatch {
                op: "slice",
                expected: rank,
                got: if start.len() != rank {
                    start.len()
                } else {
                    end.len()
                },
            });
        }
        let mut new_dims = Vec::with_capacity(rank);
        let mut new_offset = self.offset;
        for dim in 0..rank {
            let (s, e, size) = (start[dim], end[dim], self.dims()[dim]);
            if s >= e || e > size {
                return Err(Error::SliceOutOfRange {
                    dim,
                    start: s,
                    end: e,
                    dim_size: size,
                });
            }
            new_dims.push(e - s);
            new_offset += s * self.strides[dim];
        }
        Ok(Layout::new(
            Shape::new(new_dims),
            self.strides.clone(),
            new_offset,
        ))
    }

    /// Swap two dimensions without moving data.
    ///
    /// Example: [2, 3] strides [3, 1] → [3, 2] strides [1, 3]
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim0 >= rank || dim1 >= rank {
            return Err(Error::RankMismatch {
                op: "transpose",
                expected: dim0.max(dim1) + 1,
                got: rank,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        let mut new_strides = self.strides.clone();
        new_dims.swap(dim0, dim1);
        new_strides.swap(dim0, dim1);
        Ok(Layout::new(Shape::new(new_dims), new_strides, self.offset))
    }

    /// Flat buffer index for a multi-dimensional index, without bounds checks.
    /// flat_index = offset + sum(index[i] * stride[i])
    pub fn flat_index(&self, index: &[usize]) -> usize {
        let mut flat = self.offset;
        for (i, &idx) in index.iter().enumerate() {
            flat += idx * self.strides[i];
        }
        flat
    }

    /// Flat buffer index after checking arity and per-dimension bounds.
    pub fn checked_flat_index(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.rank() {
            return Err(Error::RankMismatch {
                op: "index",
                expected: self.rank(),
                got: index.len(),
            });
        }
        if index.iter().zip(self.dims()).any(|(&i, &d)| i >= d) {
            return Err(Error::IndexOutOfBounds {
                index: index.to_vec(),
                shape: self.shape.clone(),
            });
        }
        Ok(self.flat_index(index))
    }

    /// Strides that read this layout under a broadcast `target` shape.
    ///
    /// The result has `target.rank()` entries. Leading dimensions this layout
    /// lacks, and size-1 dimensions the target stretches (to more than 1, or
    /// to 0), get stride 0. The caller must have validated `target` with
    /// [`Shape::broadcast_shape`].
    pub fn broadcast_strides(&self, target: &Shape) -> Vec<usize> {
        let self_dims = self.dims();
        let target_dims = target.dims();
        let lead = target_dims.len() - self_dims.len();

        let mut result = vec![0usize; target_dims.len()];
        for i in 0..self_dims.len() {
            if self_dims[i] == target_dims[i + lead] {
                result[i + lead] = self.strides[i];
            }
        }
        result
    }

    /// Iterator over all flat indices of this layout, in logical order.
    pub fn strided_indices(&self) -> StridedIter {
        StridedIter::new(self.dims().to_vec(), self.strides.clone(), self.offset)
    }
}

// StridedIter — buffer indices of a strided walk
//
// An odometer over the logical coordinates, last dimension fastest. The
// buffer index is carried along instead of recomputed: stepping dimension d
// adds strides[d], and rolling it back over to 0 subtracts the
// (dims[d] - 1) * strides[d] that its steps added. Contiguous layouts count
// up by one from the offset; slices, transposes and broadcast reads (stride
// 0) jump around.

/// Iterator that yields flat storage indices for each logical element.
pub struct StridedIter {
    dims: Vec<usize>,
    strides: Vec<usize>,
    coords: Vec<usize>,
    /// Buffer index of the element the next call yields.
    pos: usize,
    remaining: usize,
}

impl StridedIter {
    /// Build an iterator over `dims` addressed with arbitrary `strides`
    /// (including zero strides for broadcast reads).
    pub fn new(dims: Vec<usize>, strides: Vec<usize>, offset: usize) -> Self {
        debug_assert_eq!(dims.len(), strides.len());
        let remaining = dims.iter().product();
        StridedIter {
            coords: vec![0; dims.len()],
            dims,
            strides,
            pos: offset,
            remaining,
        }
    }

    fn step(&mut self) {
        for d in (0..self.dims.len()).rev() {
            self.coords[d] += 1;
            if self.coords[d] < self.dims[d] {
                self.pos += self.strides[d];
                return;
            }
            self.coords[d] = 0;
            self.pos -= (self.dims[d] - 1) * self.strides[d];
        }
    }
}

impl Iterator for StridedIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let here = self.pos;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.step();
        }
        Some(here)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        assert!(layout.is_contiguous());
        assert_eq!(layout.strides(), &[3, 1]);
        assert_eq!(layout.offset(), 0);
    }

    #[test]
    fn test_contiguous_indices() {
        let layout = Layout::contiguous(Shape::from((2, 3)));
        let indices: Vec<usize> = layout.strided_indices().collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scalar_layout_yields_one_index() {
        let layout = Layout::contiguous(Shape::from(()));
        let indices: Vec<usize> = layout.strided_indices().collect();
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn test_transpose_indices() {
        // [[0, 1, 2],
        //  [3, 4, 5]] read column-major
        let layout = Layout::contiguous(Shape::from((2, 3)));
        let transposed = layout.transpose(0, 1).unwrap();
        assert!(!transposed.is_contiguous());
        let indices: Vec<usize> = transposed.strided_indices().collect();
        assert_eq!(indices, vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_slice_keeps_parent_strides() {
        // [4, 5] rows 1..3, cols 0..4 → [2, 4] at offset 5
        let layout = Layout::contiguous(Shape::from((4, 5)));
        let sliced = layout.slice(&[1, 0], &[3, 4]).unwrap();
        assert_eq!(sliced.dims(), &[2, 4]);
        assert_eq!(sliced.strides(), &[5, 1]);
        assert_eq!(sliced.offset(), 5);
        assert!(!sliced.is_contiguous());
        let indices: Vec<usize> = sliced.strided_indices().collect();
        assert_eq!(indices, vec![5, 6, 7, 8, 10, 11, 12, 13]);
    }

    #[test]
    fn test_row_slice_is_contiguous() {
        let layout = Layout::contiguous(Shape::from((4, 5)));
        let rows = layout.slice(&[2, 0], &[4, 5]).unwrap();
        assert!(rows.is_contiguous());
        assert_eq!(rows.offset(), 10);
    }

    #[test]
    fn test_slice_out_of_range() {
        let layout = Layout::contiguous(Shape::from((4, 6)));
        assert!(matches!(
            layout.slice(&[0, 5], &[4, 7]),
            Err(Error::SliceOutOfRange { dim: 1, .. })
        ));
        // empty ranges are rejected too
        assert!(layout.slice(&[2, 0], &[2, 6]).is_err());
        assert!(matches!(
            layout.slice(&[0], &[1]),
            Err(Error::RankMismatch { .. })
        ));
    }

    #[test]
    fn test_flat_index() {
        let layout = Layout::contiguous(Shape::from((2, 3, 4)));
        assert_eq!(layout.flat_index(&[1, 2, 3]), 23);
        assert_eq!(layout.flat_index(&[0, 0, 0]), 0);
        assert!(layout.checked_flat_index(&[2, 0, 0]).is_err());
        assert!(layout.checked_flat_index(&[1, 2]).is_err());
    }

    #[test]
    fn test_walk_matches_flat_index() {
        // every yielded index equals offset + sum(coord * stride)
        let parent = Layout::contiguous(Shape::from((3, 4, 5)));
        let view = parent.slice(&[1, 1, 2], &[3, 4, 5]).unwrap();
        let swapped = view.transpose(0, 2).unwrap();
        let got: Vec<usize> = swapped.strided_indices().collect();
        let mut want = Vec::new();
        for i in 0..3 {
            for j in 0..3 {
                for k in 0..2 {
                    want.push(swapped.flat_index(&[i, j, k]));
                }
            }
        }
        assert_eq!(got, want);
    }

    #[test]
    fn test_zero_stride_walk() {
        let it = StridedIter::new(vec![2, 3], vec![1, 0], 4);
        assert_eq!(it.len(), 6);
        assert_eq!(it.collect::<Vec<_>>(), vec![4, 4, 4, 5, 5, 5]);
        assert_eq!(StridedIter::new(vec![3, 0], vec![1, 1], 0).count(), 0);
    }

    #[test]
    fn test_broadcast_strides() {
        let layout = Layout::contiguous(Shape::from((3, 1)));
        assert_eq!(layout.broadcast_strides(&Shape::from((3, 4))), vec![1, 0]);

        let bias = Layout::contiguous(Shape::from(1));
        assert_eq!(bias.broadcast_strides(&Shape::from((10, 1))), vec![0, 1]);
    }
}
