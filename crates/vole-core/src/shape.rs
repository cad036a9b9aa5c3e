use std::fmt;

use crate::{Error, Result};

// Shape — dimension sizes of a tensor
//
//   []             scalar, one element
//   [3, 32, 32]    one channel-first image record
//   [8, 3, 32, 32] eight such records collated into a batch
//
// Datasets are sliced along the leading dimension and batches are collated
// by prepending one, so most helpers here deal with that axis.

/// Dimension sizes of a tensor, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: Vec<usize>) -> Self {
        Shape(dims)
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of axes; 0 for a scalar.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Product of the dimensions. A scalar holds one element and any zero
    /// dimension makes the count zero.
    pub fn elem_count(&self) -> usize {
        self.0.iter().product()
    }

    /// Row-major element strides: `[2, 3, 4]` gives `[12, 4, 1]`.
    pub fn stride_contiguous(&self) -> Vec<usize> {
        let mut acc = 1;
        let mut strides: Vec<usize> = self
            .0
            .iter()
            .rev()
            .map(|&d| {
                let s = acc;
                acc *= d;
                s
            })
            .collect();
        strides.reverse();
        strides
    }

    /// Size of axis `d`.
    pub fn dim(&self, d: usize) -> Result<usize> {
        match self.0.get(d) {
            Some(&n) => Ok(n),
            None => Err(Error::DimOutOfRange {
                dim: d,
                rank: self.rank(),
            }),
        }
    }

    /// Size of the leading dimension, i.e. the number of records a tensor
    /// holds when it backs a dataset.
    pub fn leading(&self) -> Result<usize> {
        self.dim(0)
    }

    /// The shape with `n` prepended as a new leading dimension.
    ///
    /// `[3, 4].with_leading(8)` is `[8, 3, 4]`.
    pub fn with_leading(&self, n: usize) -> Shape {
        Shape(std::iter::once(n).chain(self.0.iter().copied()).collect())
    }

    /// The shape without its leading dimension (scalar for rank 1).
    pub fn trailing(&self) -> Result<Shape> {
        match self.0.split_first() {
            Some((_, rest)) => Ok(Shape(rest.to_vec())),
            None => Err(Error::RankMismatch {
                expected: 1,
                got: 0,
            }),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(usize::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

// Shape::from((3, 4)), Shape::from(7), Shape::from(()) ...

impl From<()> for Shape {
    fn from(_: ()) -> Self {
        Shape::default()
    }
}

impl From<usize> for Shape {
    fn from(d: usize) -> Self {
        Shape(vec![d])
    }
}

macro_rules! shape_from_tuple {
    ($($d:ident),+) => {
        impl From<($(shape_from_tuple!(@usize $d),)+)> for Shape {
            fn from(($($d,)+): ($(shape_from_tuple!(@usize $d),)+)) -> Self {
                Shape(vec![$($d),+])
            }
        }
    };
    (@usize $d:ident) => { usize };
}

shape_from_tuple!(a, b);
shape_from_tuple!(a, b, c);
shape_from_tuple!(a, b, c, d);

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape(dims.to_vec())
    }
}

impl From<&Shape> for Shape {
    fn from(s: &Shape) -> Self {
        s.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_has_one_element() {
        let s = Shape::from(());
        assert_eq!(s.rank(), 0);
        assert_eq!(s.elem_count(), 1);
        assert!(s.stride_contiguous().is_empty());
    }

    #[test]
    fn zero_rows_means_zero_elements() {
        let s = Shape::from((0, 2));
        assert_eq!(s.elem_count(), 0);
        assert_eq!(s.leading().unwrap(), 0);
    }

    #[test]
    fn row_major_strides() {
        assert_eq!(Shape::from((2, 3, 4)).stride_contiguous(), vec![12, 4, 1]);
        assert_eq!(Shape::from((5, 1, 2, 3)).stride_contiguous(), vec![6, 6, 3, 1]);
        assert_eq!(Shape::from(7).stride_contiguous(), vec![1]);
    }

    #[test]
    fn leading_axis_helpers() {
        let record = Shape::from((3, 4));
        let batch = record.with_leading(8);
        assert_eq!(batch.dims(), &[8, 3, 4]);
        assert_eq!(batch.trailing().unwrap(), record);
        assert_eq!(Shape::from(5).trailing().unwrap(), Shape::from(()));
        assert!(Shape::from(()).trailing().is_err());
        assert!(Shape::from(()).leading().is_err());
    }

    #[test]
    fn display_lists_dims() {
        assert_eq!(Shape::from((1, 28, 28)).to_string(), "[1, 28, 28]");
        assert_eq!(Shape::from(()).to_string(), "[]");
    }
}
