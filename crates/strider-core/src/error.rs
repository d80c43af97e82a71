use crate::shape::Shape;

/// All errors that can occur within Strider.
///
/// Every failure is returned to the direct caller; no operation retries and
/// no operation leaves its inputs partially mutated. [`Error::kind`] groups
/// the variants into the four failure categories callers usually care about.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The element buffer (or its size computation) could not be allocated.
    #[error("allocation of {bytes} bytes failed")]
    Allocation { bytes: usize },

    /// `product(shape) * dtype_size` does not fit in `usize`.
    #[error("shape {dims:?} overflows the addressable size for {dtype}")]
    SizeOverflow { dims: Vec<usize>, dtype: crate::DType },

    /// Shape mismatch between two tensors that must agree exactly.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Two shapes are not broadcast-compatible.
    #[error("shapes {lhs} and {rhs} are not broadcast-compatible (dim {dim} from right: {ld} vs {rd})")]
    BroadcastMismatch {
        lhs: Shape,
        rhs: Shape,
        dim: usize,
        ld: usize,
        rd: usize,
    },

    /// Matrix multiplication dimension mismatch.
    #[error("matmul shape mismatch: [{m}x{k1}] @ [{k2}x{n}], inner dims must match")]
    MatmulShapeMismatch {
        m: usize,
        k1: usize,
        k2: usize,
        n: usize,
    },

    /// Cannot reshape because element counts differ.
    #[error(
        "cannot reshape: source has {src} elements, target shape {dst_shape} has {dst} elements"
    )]
    ReshapeElementMismatch {
        src: usize,
        dst: usize,
        dst_shape: Shape,
    },

    /// Element count mismatch when creating from a flat buffer.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Operation requires a specific rank (number of dimensions).
    #[error("{op}: rank mismatch, expected rank {expected}, got {got}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        got: usize,
    },

    /// The operation needs a contiguous row-major layout.
    #[error("{op}: tensor with shape {shape} and strides {strides:?} is not contiguous")]
    NotContiguous {
        op: &'static str,
        shape: Shape,
        strides: Vec<usize>,
    },

    /// Tried to read a single value out of a tensor with more than one element.
    #[error("not a scalar: tensor has shape {shape}")]
    NotAScalar { shape: Shape },

    /// Slice bounds violate `start < end <= dim_size`.
    #[error("slice out of range: dim {dim}, start {start}, end {end}, dim_size {dim_size}")]
    SliceOutOfRange {
        dim: usize,
        start: usize,
        end: usize,
        dim_size: usize,
    },

    /// A multi-dimensional index falls outside the tensor's shape.
    #[error("index {index:?} out of bounds for shape {shape}")]
    IndexOutOfBounds { index: Vec<usize>, shape: Shape },

    /// A raw element offset falls outside the underlying buffer.
    #[error("offset {offset} out of bounds for buffer of {len} elements")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// A value could not be represented in the requested Rust type.
    #[error("value {value} is not representable as {target}")]
    Cast { value: f64, target: &'static str },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

/// Coarse failure category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Memory exhaustion or size overflow while allocating.
    Allocation,
    /// Incompatible dimensions (broadcast, matmul, dot, reshape, exact-shape ops).
    ShapeMismatch,
    /// Slice bounds, indices, or offsets outside the valid range.
    Range,
    /// Wrong rank, non-contiguous input, or an invalid argument.
    Precondition,
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Allocation { .. } | Error::SizeOverflow { .. } => ErrorKind::Allocation,
            Error::ShapeMismatch { .. }
            | Error::BroadcastMismatch { .. }
            | Error::MatmulShapeMismatch { .. }
            | Error::ReshapeElementMismatch { .. }
            | Error::ElementCountMismatch { .. } => ErrorKind::ShapeMismatch,
            Error::SliceOutOfRange { .. }
            | Error::IndexOutOfBounds { .. }
            | Error::OffsetOutOfBounds { .. } => ErrorKind::Range,
            Error::RankMismatch { .. }
            | Error::NotContiguous { .. }
            | Error::NotAScalar { .. }
            | Error::Cast { .. }
            | Error::Msg(_) => ErrorKind::Precondition,
        }
    }
}

/// Convenience Result type used throughout Strider.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
