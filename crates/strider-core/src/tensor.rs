use std::fmt;

use crate::dtype::{DType, WithDType};
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::shape::Shape;
use crate::storage::Storage;

// Tensor — The fundamental data structure
//
// A Tensor is shape/stride/dtype metadata plus a handle onto a shared
// element buffer.
//
// MEMORY MODEL:
//
//   Every tensor holds one `Storage` handle (an Rc). The tensor that
//   allocated the buffer is its *owner*; tensors produced by `slice` are
//   *views* that alias the same buffer at an element offset and keep the
//   parent's strides. Creating a view retains the buffer, dropping any
//   handle releases it, and the buffer is freed when the last handle of
//   either kind is gone. Releasing the owner first is therefore safe: the
//   views keep the buffer alive, and nothing is ever freed twice.
//
//   Writes through any alias are visible through all others. Nothing stops
//   two views from overlapping; callers reason about aliasing themselves.
//
// CHECKED ACCESS:
//
//   `get`/`set` check index arity and bounds, `read_at`/`write_at` check
//   the raw offset against the buffer, and `reshape` refuses non-contiguous
//   layouts. Division by zero is not an error: it follows IEEE-754.

/// Whether a tensor allocated its buffer or aliases someone else's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    View,
}

/// An n-dimensional, strided array of numbers.
///
/// Tensors are not `Clone`: a second handle onto the same buffer is made
/// with [`slice`](Tensor::slice) and an independent one with
/// [`copy`](Tensor::copy). Not `Send`/`Sync` either; see
/// [`storage`](crate::storage).
///
/// # Example
/// ```
/// use strider_core::{DType, Tensor};
///
/// let a = Tensor::from_f64_slice(&[1.0, 2.0, 3.0, 4.0], (2, 2), DType::F64)?;
/// let b = Tensor::full((2, 2), 1.0, DType::F64)?;
/// let c = a.add(&b)?;
/// assert_eq!(c.to_f64_vec(), vec![2.0, 3.0, 4.0, 5.0]);
/// # Ok::<(), strider_core::Error>(())
/// ```
pub struct Tensor {
    storage: Storage,
    layout: Layout,
    dtype: DType,
    role: Role,
}

impl Tensor {
    // Internal constructors

    pub(crate) fn from_storage(storage: Storage, layout: Layout, dtype: DType, role: Role) -> Self {
        Tensor {
            storage,
            layout,
            dtype,
            role,
        }
    }

    pub(crate) fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Materialize the elements addressed by `layout` (a layout over this
    /// tensor's buffer) into a new contiguous owner.
    fn gather(&self, layout: &Layout) -> Result<Self> {
        let out = Self::zeros(layout.shape().clone(), self.dtype)?;
        self.storage.with(|src| {
            out.storage.with_mut(|dst| {
                for (i, src_idx) in layout.strided_indices().enumerate() {
                    dst.write(i, src.read(src_idx));
                }
            })
        });
        Ok(out)
    }

    // Creation methods

    /// Create a zero-filled tensor owning a fresh buffer.
    ///
    /// Fails with an allocation-kind error if `product(shape) * dtype_size`
    /// or any row-major stride overflows, or the allocator refuses the request.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        let shape = shape.into();
        let sized = shape
            .checked_elem_count()
            .filter(|n| n.checked_mul(dtype.size_in_bytes()).is_some())
            .zip(shape.checked_stride_contiguous());
        let Some((len, strides)) = sized else {
            return Err(Error::SizeOverflow {
                dims: shape.dims().to_vec(),
                dtype,
            });
        };
        let storage = Storage::allocate(len, dtype)?;
        Ok(Self::from_storage(
            storage,
            Layout::new(shape, strides, 0),
            dtype,
            Role::Owner,
        ))
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: impl Into<Shape>, val: f64, dtype: DType) -> Result<Self> {
        let mut t = Self::zeros(shape, dtype)?;
        t.fill(val);
        Ok(t)
    }

    /// Create a tensor from a flat row-major slice of canonical values.
    pub fn from_f64_slice(data: &[f64], shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        let shape = shape.into();
        let Some(expected) = shape.checked_elem_count() else {
            return Err(Error::SizeOverflow {
                dims: shape.dims().to_vec(),
                dtype,
            });
        };
        if data.len() != expected {
            return Err(Error::ElementCountMismatch {
                expected,
                got: data.len(),
                shape,
            });
        }
        let t = Self::zeros(shape, dtype)?;
        t.storage.with_mut(|buf| {
            for (i, &v) in data.iter().enumerate() {
                buf.write(i, v);
            }
        });
        Ok(t)
    }

    /// Create a tensor from typed values; the dtype follows `T`.
    pub fn from_vec<T: WithDType>(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        let values: Vec<f64> = data.into_iter().map(WithDType::to_f64).collect();
        Self::from_f64_slice(&values, shape, T::DTYPE)
    }

    // Accessors

    /// The shape of this tensor.
    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    /// The dimensions as a slice (shortcut for shape().dims()).
    pub fn dims(&self) -> &[usize] {
        self.layout.dims()
    }

    /// Number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Per-dimension element strides.
    pub fn strides(&self) -> &[usize] {
        self.layout.strides()
    }

    /// Total number of elements, always `product(dims)`.
    pub fn elem_count(&self) -> usize {
        self.layout.elem_count()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// The memory layout (shape + strides + offset).
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Element offset of this tensor's first element within the buffer.
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    pub fn byte_offset(&self) -> usize {
        self.layout.offset() * self.dtype.size_in_bytes()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }

    pub fn is_view(&self) -> bool {
        self.role == Role::View
    }

    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// Number of live handles (owner plus views) on the underlying buffer.
    pub fn ref_count(&self) -> usize {
        self.storage.ref_count()
    }

    /// Whether `self` and `other` alias the same buffer.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    // Lifecycle

    /// Deep copy into a new owner with the same shape and dtype.
    ///
    /// Owners are duplicated buffer-for-buffer and keep their strides. Views
    /// are gathered in logical order into a contiguous buffer sized to the
    /// view, since their inherited strides describe the parent's allocation.
    pub fn copy(&self) -> Result<Self> {
        let whole_buffer = self.layout.offset() == 0
            && self.layout.is_contiguous()
            && self.elem_count() == self.storage.len();
        if whole_buffer {
            let storage = self.storage.duplicate()?;
            return Ok(Self::from_storage(
                storage,
                self.layout.clone(),
                self.dtype,
                Role::Owner,
            ));
        }
        self.gather(&self.layout)
    }

    /// Give up this handle. Equivalent to dropping it.
    ///
    /// The buffer is freed once its last handle, owner or view, is released.
    pub fn release(self) {
        drop(self)
    }

    // Shape manipulation

    /// Reshape in place, keeping the element count.
    ///
    /// Fails with [`Error::ReshapeElementMismatch`] if the counts differ
    /// (a target count that overflows `usize` is reported as `usize::MAX`),
    /// with [`Error::SizeOverflow`] if the new strides overflow, and with
    /// [`Error::NotContiguous`] if the current layout is not dense row-major
    /// (e.g. a column slice); call [`copy`](Tensor::copy) first in that
    /// case. On failure the tensor is left untouched.
    pub fn reshape(&mut self, new_shape: impl Into<Shape>) -> Result<()> {
        let new_shape = new_shape.into();
        let current = self.elem_count();
        let wanted = new_shape.checked_elem_count().unwrap_or(usize::MAX);
        if current != wanted {
            return Err(Error::ReshapeElementMismatch {
                src: current,
                dst: wanted,
                dst_shape: new_shape,
            });
        }
        if !self.is_contiguous() {
            return Err(Error::NotContiguous {
                op: "reshape",
                shape: self.shape().clone(),
                strides: self.strides().to_vec(),
            });
        }
        let Some(strides) = new_shape.checked_stride_contiguous() else {
            return Err(Error::SizeOverflow {
                dims: new_shape.dims().to_vec(),
                dtype: self.dtype,
            });
        };
        self.layout = Layout::new(new_shape, strides, self.layout.offset());
        Ok(())
    }

    /// Create a view of `[start[i], end[i])` along every dimension.
    ///
    /// The view shares this tensor's buffer, inherits its strides, and
    /// starts `sum(start[i] * strides[i])` elements further in. Requires
    /// `start[i] < end[i] <= dims[i]` for all `i`; nothing is allocated or
    /// retained on failure.
    pub fn slice(&self, start: &[usize], end: &[usize]) -> Result<Self> {
        let layout = self.layout.slice(start, end)?;
        Ok(Self::from_storage(
            self.storage.retain(),
            layout,
            self.dtype,
            Role::View,
        ))
    }

    /// Materialized transpose of a 2-D tensor: a new `[n, m]` owner.
    pub fn transpose(&self) -> Result<Self> {
        if self.rank() != 2 {
            return Err(Error::RankMismatch {
                op: "transpose",
                expected: 2,
                got: self.rank(),
            });
        }
        let swapped = self.layout.transpose(0, 1)?;
        self.gather(&swapped)
    }

    // Element access

    /// Read the element at a multi-dimensional index.
    pub fn get(&self, index: &[usize]) -> Result<f64> {
        let flat = self.layout.checked_flat_index(index)?;
        self.storage.read(flat)
    }

    /// Write the element at a multi-dimensional index (converted to the dtype).
    pub fn set(&mut self, index: &[usize], value: f64) -> Result<()> {
        let flat = self.layout.checked_flat_index(index)?;
        self.storage.write(flat, value)
    }

    /// Read the element `offset` slots past this tensor's base offset.
    ///
    /// Raw access: the offset is checked against the whole buffer, not the
    /// tensor's shape, so a view may reach elements outside its own extent.
    pub fn read_at(&self, offset: usize) -> Result<f64> {
        let flat = self.raw_index(offset)?;
        self.storage.read(flat)
    }

    /// Write the element `offset` slots past this tensor's base offset.
    pub fn write_at(&mut self, offset: usize, value: f64) -> Result<()> {
        let flat = self.raw_index(offset)?;
        self.storage.write(flat, value)
    }

    fn raw_index(&self, offset: usize) -> Result<usize> {
        self.layout
            .offset()
            .checked_add(offset)
            .ok_or(Error::OffsetOutOfBounds {
                offset,
                len: self.storage.len(),
            })
    }

    // In-place mutation

    /// Set every element to `value`.
    pub fn fill(&mut self, value: f64) {
        self.map_inplace(|_| value);
    }

    /// Replace every element `x` with `f(x)`, in logical order.
    ///
    /// All inputs are read before `f` first runs and nothing is written until
    /// it has run for every element, so `f` may read this tensor's aliases;
    /// it sees the values from before the call.
    pub fn map_inplace(&mut self, f: impl FnMut(f64) -> f64) {
        let updated: Vec<f64> = self.to_f64_vec().into_iter().map(f).collect();
        let layout = &self.layout;
        self.storage.with_mut(|buf| {
            for (idx, v) in layout.strided_indices().zip(updated) {
                buf.write(idx, v);
            }
        });
    }

    /// Multiply every element by `factor`.
    pub fn scale_inplace(&mut self, factor: f64) {
        self.map_inplace(|x| x * factor);
    }

    /// `self -= alpha * other`, elementwise. Shapes must match exactly.
    pub fn sub_scaled_inplace(&mut self, other: &Tensor, alpha: f64) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().clone(),
                got: other.shape().clone(),
            });
        }
        // Read in the same logical order `map_inplace` walks `self`.
        let rhs = other.to_f64_vec();
        let mut it = rhs.into_iter();
        self.map_inplace(|x| x - alpha * it.next().unwrap_or(0.0));
        Ok(())
    }

    // Data extraction

    /// All elements as f64, in logical row-major order.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.storage.with(|buf| {
            self.layout
                .strided_indices()
                .map(|idx| buf.read(idx))
                .collect()
        })
    }

    /// All elements converted to `T`, in logical row-major order.
    pub fn to_vec<T: WithDType>(&self) -> Result<Vec<T>> {
        self.to_f64_vec()
            .into_iter()
            .map(|v| {
                num_traits::cast::<f64, T>(v).ok_or(Error::Cast {
                    value: v,
                    target: std::any::type_name::<T>(),
                })
            })
            .collect()
    }

    /// Extract the value of a single-element tensor.
    pub fn to_scalar_f64(&self) -> Result<f64> {
        if self.elem_count() != 1 {
            return Err(Error::NotAScalar {
                shape: self.shape().clone(),
            });
        }
        let idx = self.layout.offset();
        self.storage.read(idx)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, strides={:?}, offset={}, dtype={}, role={:?}, refs={})",
            self.shape(),
            self.strides(),
            self.offset(),
            self.dtype,
            self.role,
            self.ref_count(),
        )
    }
}

const PREVIEW_LEN: usize = 10;

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ndim = {}", self.rank())?;
        writeln!(f, "shape = {}", self.shape())?;
        writeln!(f, "strides = {:?}", self.strides())?;
        writeln!(f, "dtype = {}", self.dtype)?;
        writeln!(f, "num_elems = {}", self.elem_count())?;
        writeln!(f, "owner = {}, refs = {}", self.is_owner(), self.ref_count())?;
        let values = self.storage.with(|buf| {
            self.layout
                .strided_indices()
                .take(PREVIEW_LEN)
                .map(|idx| buf.read(idx))
                .collect::<Vec<_>>()
        });
        write!(f, "data = [")?;
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.3}", v)?;
        }
        if self.elem_count() > PREVIEW_LEN {
            write!(f, ", ...")?;
        }
        write!(f, "]")
    }
}
