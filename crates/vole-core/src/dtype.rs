use std::fmt;

// DType — element types a pipeline tensor can be tagged with
//
//   F32 — 32-bit float, what transforms emit for network input
//   F64 — 64-bit float, for high-precision work
//   U8  — unsigned byte, raw image pixels
//   I64 — signed 64-bit int, labels and index tensors

/// Enum of all supported element data types.
///
/// Host tensors keep their elements as `f64`; the dtype decides how values
/// are rounded when a tensor is created or cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    U8,
    I64,
}

impl DType {
    /// Size of one element in bytes on a device runtime.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
            DType::U8 => 1,
            DType::I64 => 8,
        }
    }

    /// Whether this dtype is a floating-point type.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }

    /// Round a value to what this dtype can represent.
    ///
    /// Integer types truncate toward zero; `U8` additionally saturates to
    /// `[0, 255]`. `F32` goes through a real `f32` round trip.
    pub fn quantize(&self, v: f64) -> f64 {
        match self {
            DType::F64 => v,
            DType::F32 => v as f32 as f64,
            DType::U8 => v.trunc().clamp(0.0, 255.0),
            DType::I64 => v as i64 as f64,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::U8 => "u8",
            DType::I64 => "i64",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::U8.size_in_bytes(), 1);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(DType::U8.quantize(300.7), 255.0);
        assert_eq!(DType::U8.quantize(-4.0), 0.0);
        assert_eq!(DType::I64.quantize(-2.9), -2.0);
        assert_eq!(DType::F32.quantize(3.14), 3.140000104904175);
        assert_eq!(DType::F64.quantize(3.14), 3.14);
    }

    #[test]
    fn test_display() {
        assert_eq!(DType::I64.to_string(), "i64");
    }
}
