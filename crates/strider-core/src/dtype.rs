use std::fmt;

// DType — the closed set of element types
//
// Every tensor carries a DType that fixes its element width. Values cross
// every component boundary as f64 (the canonical double); conversion to the
// storage type happens only when a buffer slot is written:
//
//   F32 — rounded to the nearest f32
//   F64 — stored as-is
//   I32 — truncated toward zero, saturating at i32::MIN / i32::MAX, NaN -> 0

/// Enum of all supported element data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    I32,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
            DType::I32 => 4,
        }
    }

    /// Whether this dtype is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    /// The canonical value a slot of this dtype holds after `v` is written to it.
    pub fn round_trip(&self, v: f64) -> f64 {
        match self {
            DType::F32 => f32::from_f64(v).to_f64(),
            DType::F64 => v,
            DType::I32 => i32::from_f64(v).to_f64(),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I32 => "i32",
        };
        write!(f, "{}", s)
    }
}

// WithDType — Trait that connects Rust types to the DType enum
//
// Lets typed constructors such as `Tensor::from_vec::<f32>` pick the DType
// from the element type, and typed extractors convert back out.

/// Trait implemented by Rust types that can be stored in a tensor.
pub trait WithDType: Copy + 'static + num_traits::NumCast + fmt::Debug {
    /// The corresponding DType enum variant.
    const DTYPE: DType;

    /// Convert this value to the canonical f64.
    fn to_f64(self) -> f64;

    /// Store a canonical f64 as this type (the write-time conversion).
    fn from_f64(v: f64) -> Self;
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl WithDType for f64 {
    const DTYPE: DType = DType::F64;
    fn to_f64(self) -> f64 {
        self
    }
    fn from_f64(v: f64) -> Self {
        v
    }
}

impl WithDType for i32 {
    const DTYPE: DType = DType::I32;
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_f64(v: f64) -> Self {
        // `as` truncates toward zero and saturates; NaN becomes 0.
        v as i32
    }
}
