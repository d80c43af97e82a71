//! Buffer ownership layer.
//!
//! A [`Storage`] is a handle onto one shared, typed element buffer. Handles
//! are reference counted with [`Rc`]: allocating creates the first handle,
//! [`Storage::retain`] adds one, and dropping (or [`Storage::release`]) a
//! handle removes one. The buffer is freed exactly once, when the last
//! handle goes away, regardless of whether that handle belongs to the
//! allocating tensor or to a view of it.
//!
//! # Concurrency
//!
//! The count is non-atomic and the buffer sits behind a
//! [`RefCell`], so `Storage` is neither `Send` nor `Sync`. A buffer and all
//! of its aliases live on one thread; writes through any alias are visible
//! through every other alias immediately.

use std::cell::{Cell, RefCell};
use std::collections::TryReserveError;
use std::fmt;
use std::rc::Rc;

use crate::dtype::{DType, WithDType};
use crate::error::{Error, Result};

thread_local! {
    static LIVE_BUFFERS: Cell<usize> = const { Cell::new(0) };
}

/// Number of element buffers currently allocated on this thread.
///
/// Every allocation increments the counter and every free decrements it, so
/// tests can assert that a sequence of operations neither leaks nor double
/// frees.
pub fn live_buffers() -> usize {
    LIVE_BUFFERS.with(|c| c.get())
}

// The closed set of typed payloads. Only `read`/`write` cross between the
// storage type and the canonical f64.
enum Elements {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
}

fn zeroed<T: WithDType>(len: usize) -> std::result::Result<Vec<T>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, T::from_f64(0.0));
    Ok(v)
}

/// A zero-initialized, fixed-length element buffer.
pub(crate) struct Buffer {
    elems: Elements,
}

impl Buffer {
    fn zeros(len: usize, dtype: DType) -> Result<Self> {
        let bytes = len
            .checked_mul(dtype.size_in_bytes())
            .ok_or(Error::Allocation { bytes: usize::MAX })?;
        let alloc_err = |_| Error::Allocation { bytes };
        let elems = match dtype {
            DType::F32 => Elements::F32(zeroed(len).map_err(alloc_err)?),
            DType::F64 => Elements::F64(zeroed(len).map_err(alloc_err)?),
            DType::I32 => Elements::I32(zeroed(len).map_err(alloc_err)?),
        };
        LIVE_BUFFERS.with(|c| c.set(c.get() + 1));
        log::trace!("allocated {} x {} ({} bytes)", len, dtype, bytes);
        Ok(Buffer { elems })
    }

    pub fn dtype(&self) -> DType {
        match self.elems {
            Elements::F32(_) => DType::F32,
            Elements::F64(_) => DType::F64,
            Elements::I32(_) => DType::I32,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match &self.elems {
            Elements::F32(v) => v.len(),
            Elements::F64(v) => v.len(),
            Elements::I32(v) => v.len(),
        }
    }

    /// Read element `i` as a canonical f64. `i` must be `< len()`.
    #[inline]
    pub fn read(&self, i: usize) -> f64 {
        match &self.elems {
            Elements::F32(v) => v[i].to_f64(),
            Elements::F64(v) => v[i],
            Elements::I32(v) => v[i].to_f64(),
        }
    }

    /// Convert `value` to the buffer's dtype and store it at `i`.
    #[inline]
    pub fn write(&mut self, i: usize, value: f64) {
        match &mut self.elems {
            Elements::F32(v) => v[i] = f32::from_f64(value),
            Elements::F64(v) => v[i] = value,
            Elements::I32(v) => v[i] = i32::from_f64(value),
        }
    }

    /// Copy every element of `src` (same dtype and length) into `self`.
    fn copy_from(&mut self, src: &Buffer) {
        match (&mut self.elems, &src.elems) {
            (Elements::F32(d), Elements::F32(s)) => d.copy_from_slice(s),
            (Elements::F64(d), Elements::F64(s)) => d.copy_from_slice(s),
            (Elements::I32(d), Elements::I32(s)) => d.copy_from_slice(s),
            _ => {
                for i in 0..self.len() {
                    self.write(i, src.read(i));
                }
            }
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        LIVE_BUFFERS.with(|c| c.set(c.get() - 1));
        log::trace!("freed {} x {}", self.len(), self.dtype());
    }
}

/// Shared handle onto a [`Buffer`].
pub struct Storage {
    buf: Rc<RefCell<Buffer>>,
}

impl Storage {
    /// Allocate a zero-filled buffer of `len` elements.
    pub fn allocate(len: usize, dtype: DType) -> Result<Self> {
        Ok(Storage {
            buf: Rc::new(RefCell::new(Buffer::zeros(len, dtype)?)),
        })
    }

    /// Allocate a new buffer holding an element-for-element copy of `self`.
    pub fn duplicate(&self) -> Result<Self> {
        let src = self.buf.borrow();
        let mut fresh = Buffer::zeros(src.len(), src.dtype())?;
        fresh.copy_from(&src);
        Ok(Storage {
            buf: Rc::new(RefCell::new(fresh)),
        })
    }

    /// Add a handle onto the same buffer.
    pub fn retain(&self) -> Self {
        Storage {
            buf: Rc::clone(&self.buf),
        }
    }

    /// Give up this handle. Frees the buffer if it was the last one.
    pub fn release(self) {
        drop(self)
    }

    /// Number of live handles on the buffer.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.buf)
    }

    /// Whether both handles refer to the same buffer.
    pub fn ptr_eq(&self, other: &Storage) -> bool {
        Rc::ptr_eq(&self.buf, &other.buf)
    }

    pub fn dtype(&self) -> DType {
        self.buf.borrow().dtype()
    }

    pub fn len(&self) -> usize {
        self.buf.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read element `i` with a bounds check.
    pub fn read(&self, i: usize) -> Result<f64> {
        let buf = self.buf.borrow();
        if i >= buf.len() {
            return Err(Error::OffsetOutOfBounds {
                offset: i,
                len: buf.len(),
            });
        }
        Ok(buf.read(i))
    }

    /// Write element `i` with a bounds check.
    pub fn write(&self, i: usize, value: f64) -> Result<()> {
        let mut buf = self.buf.borrow_mut();
        if i >= buf.len() {
            return Err(Error::OffsetOutOfBounds {
                offset: i,
                len: buf.len(),
            });
        }
        buf.write(i, value);
        Ok(())
    }

    /// Run `f` with shared access to the buffer.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&Buffer) -> R) -> R {
        f(&self.buf.borrow())
    }

    /// Run `f` with exclusive access to the buffer.
    ///
    /// `f` must not reach any other handle on the same buffer; the borrow
    /// would panic. Crate-internal callers only pass closures that touch the
    /// `Buffer` argument, never caller-supplied code.
    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut Buffer) -> R) -> R {
        f(&mut self.buf.borrow_mut())
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Storage(dtype={}, len={}, refs={})",
            self.dtype(),
            self.len(),
            self.ref_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let s = Storage::allocate(4, DType::I32).unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.dtype(), DType::I32);
        for i in 0..4 {
            assert_eq!(s.read(i).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_write_converts_at_store_time() {
        let s = Storage::allocate(2, DType::I32).unwrap();
        s.write(0, 3.9).unwrap();
        s.write(1, -3.9).unwrap();
        assert_eq!(s.read(0).unwrap(), 3.0);
        assert_eq!(s.read(1).unwrap(), -3.0);
        assert!(matches!(
            s.read(2),
            Err(Error::OffsetOutOfBounds { offset: 2, len: 2 })
        ));
    }

    #[test]
    fn test_retain_release_frees_once() {
        let before = live_buffers();
        let owner = Storage::allocate(8, DType::F64).unwrap();
        assert_eq!(live_buffers(), before + 1);

        let alias = owner.retain();
        assert_eq!(owner.ref_count(), 2);
        assert!(alias.ptr_eq(&owner));

        alias.write(3, 1.5).unwrap();
        assert_eq!(owner.read(3).unwrap(), 1.5);

        alias.release();
        assert_eq!(owner.ref_count(), 1);
        assert_eq!(live_buffers(), before + 1);

        owner.release();
        assert_eq!(live_buffers(), before);
    }

    #[test]
    fn test_last_alias_frees_even_after_first_handle() {
        let before = live_buffers();
        let owner = Storage::allocate(2, DType::F32).unwrap();
        let alias = owner.retain();
        drop(owner);
        assert_eq!(live_buffers(), before + 1);
        assert_eq!(alias.ref_count(), 1);
        drop(alias);
        assert_eq!(live_buffers(), before);
    }

    #[test]
    fn test_duplicate_is_independent() {
        let a = Storage::allocate(3, DType::F64).unwrap();
        a.write(1, 2.0).unwrap();
        let b = a.duplicate().unwrap();
        b.write(1, 9.0).unwrap();
        assert_eq!(a.read(1).unwrap(), 2.0);
        assert_eq!(b.read(1).unwrap(), 9.0);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_size_overflow_is_allocation_error() {
        let err = Storage::allocate(usize::MAX, DType::F64).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Allocation);
    }
}
