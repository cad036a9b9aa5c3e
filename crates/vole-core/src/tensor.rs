use std::fmt;
use std::sync::Arc;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::shape::Shape;

// Tensor — host-resident n-dimensional array
//
// This is the narrow slice of a numeric runtime the data pipeline needs:
// allocation from host values, slicing along a dimension, stacking records
// into a batch, reshaping/permuting for transforms, and shape/dtype
// introspection. It is not an autograd tensor and does no arithmetic
// beyond element-wise mapping.
//
// MEMORY MODEL:
//
//   Elements live in an `Arc<[f64]>`, always contiguous and row-major.
//   Cloning a Tensor is O(1); every operation that changes layout copies
//   into fresh storage, so a tensor is immutable once built and can be
//   shared freely across worker threads.
//
//   The storage is released when the last handle is dropped. A Batch that
//   owns the only handles to its tensors frees them when it goes out of
//   scope.

/// An immutable, cheaply clonable host tensor.
#[derive(Clone)]
pub struct Tensor {
    data: Arc<[f64]>,
    shape: Shape,
    dtype: DType,
}

impl Tensor {
    // Creation

    /// Create a tensor from a flat slice of f64 values.
    /// Values are rounded to what `dtype` can represent.
    pub fn from_f64_slice(data: &[f64], shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape, dtype)
    }

    /// Create a tensor taking ownership of a flat vector of f64 values.
    pub fn from_vec(mut data: Vec<f64>, shape: impl Into<Shape>, dtype: DType) -> Result<Self> {
        let shape = shape.into();
        if data.len() != shape.elem_count() {
            return Err(Error::ElementCountMismatch {
                expected: shape.elem_count(),
                got: data.len(),
                shape,
            });
        }
        if dtype != DType::F64 {
            for v in &mut data {
                *v = dtype.quantize(*v);
            }
        }
        Ok(Self {
            data: data.into(),
            shape,
            dtype,
        })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Self {
        let shape = shape.into();
        Self {
            data: vec![0.0; shape.elem_count()].into(),
            shape,
            dtype,
        }
    }

    /// Create a 1-D tensor with values [0, 1, ..., n-1].
    pub fn arange(n: usize, dtype: DType) -> Self {
        let data: Vec<f64> = (0..n).map(|i| i as f64).collect();
        Self {
            data: data.into(),
            shape: Shape::from(n),
            dtype,
        }
    }

    // Introspection

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn elem_count(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Borrow the flat row-major elements.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    // Slicing

    /// Narrow (slice) along a dimension, copying the selected range.
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Self> {
        let dim_size = self.shape.dim(dim)?;
        if start + len > dim_size {
            return Err(Error::NarrowOutOfBounds {
                dim,
                start,
                len,
                dim_size,
            });
        }
        let dims = self.dims();
        let outer: usize = dims[..dim].iter().product();
        let inner: usize = dims[dim + 1..].iter().product();

        let mut out = Vec::with_capacity(outer * len * inner);
        for o in 0..outer {
            let base = o * dim_size * inner;
            out.extend_from_slice(&self.data[base + start * inner..base + (start + len) * inner]);
        }

        let mut new_dims = dims.to_vec();
        new_dims[dim] = len;
        Ok(Self {
            data: out.into(),
            shape: Shape::new(new_dims),
            dtype: self.dtype,
        })
    }

    /// Select entry `index` along the leading dimension, dropping that axis.
    ///
    /// A `[100, 2]` tensor yields `[2]` rows; a `[100]` tensor yields scalars.
    pub fn get(&self, index: usize) -> Result<Self> {
        let trailing = self.shape.trailing()?;
        let rows = self.shape.leading()?;
        if index >= rows {
            return Err(Error::NarrowOutOfBounds {
                dim: 0,
                start: index,
                len: 1,
                dim_size: rows,
            });
        }
        let inner = trailing.elem_count();
        Ok(Self {
            data: self.data[index * inner..(index + 1) * inner].into(),
            shape: trailing,
            dtype: self.dtype,
        })
    }

    // Layout

    /// Reshape to a new shape with the same element count.
    pub fn reshape(&self, new_shape: impl Into<Shape>) -> Result<Self> {
        let new_shape = new_shape.into();
        if new_shape.elem_count() != self.elem_count() {
            return Err(Error::ReshapeElementMismatch {
                src: self.elem_count(),
                dst: new_shape.elem_count(),
                dst_shape: new_shape,
            });
        }
        Ok(Self {
            data: self.data.clone(),
            shape: new_shape,
            dtype: self.dtype,
        })
    }

    /// Insert a dimension of size 1 at `dim`.
    pub fn unsqueeze(&self, dim: usize) -> Result<Self> {
        if dim > self.rank() {
            return Err(Error::DimOutOfRange {
                dim,
                rank: self.rank() + 1,
            });
        }
        let mut dims = self.dims().to_vec();
        dims.insert(dim, 1);
        self.reshape(dims)
    }

    /// Reorder dimensions, e.g. `permute(&[2, 0, 1])` turns HWC into CHW.
    pub fn permute(&self, order: &[usize]) -> Result<Self> {
        let rank = self.rank();
        if order.len() != rank {
            return Err(Error::RankMismatch {
                expected: rank,
                got: order.len(),
            });
        }
        let mut seen = vec![false; rank];
        for &d in order {
            if d >= rank || seen[d] {
                crate::bail!("permute: {:?} is not a permutation of 0..{}", order, rank);
            }
            seen[d] = true;
        }

        let src_dims = self.dims();
        let src_strides = self.shape.stride_contiguous();
        let dst_dims: Vec<usize> = order.iter().map(|&d| src_dims[d]).collect();
        // Stride in the source for each destination axis.
        let walk: Vec<usize> = order.iter().map(|&d| src_strides[d]).collect();

        let n = self.elem_count();
        let mut out = Vec::with_capacity(n);
        let mut counter = vec![0usize; rank];
        for _ in 0..n {
            let offset: usize = counter.iter().zip(&walk).map(|(c, s)| c * s).sum();
            out.push(self.data[offset]);
            for axis in (0..rank).rev() {
                counter[axis] += 1;
                if counter[axis] < dst_dims[axis] {
                    break;
                }
                counter[axis] = 0;
            }
        }

        Ok(Self {
            data: out.into(),
            shape: Shape::new(dst_dims),
            dtype: self.dtype,
        })
    }

    // Concatenation

    /// Concatenate tensors along an existing dimension.
    ///
    /// All tensors must agree on every dimension except `dim` and share a dtype.
    pub fn cat(tensors: &[Self], dim: usize) -> Result<Self> {
        let first = tensors
            .first()
            .ok_or_else(|| Error::msg("cat: empty tensor list"))?;
        let rank = first.rank();
        if dim >= rank {
            return Err(Error::DimOutOfRange { dim, rank });
        }
        for t in &tensors[1..] {
            if t.dtype != first.dtype {
                return Err(Error::msg(format!(
                    "cat: dtype {} does not match {}",
                    t.dtype, first.dtype
                )));
            }
            let same_rest = t.rank() == rank
                && t.dims()
                    .iter()
                    .zip(first.dims())
                    .enumerate()
                    .all(|(i, (a, b))| i == dim || a == b);
            if !same_rest {
                return Err(Error::ShapeMismatch {
                    expected: first.shape.clone(),
                    got: t.shape.clone(),
                });
            }
        }

        let outer: usize = first.dims()[..dim].iter().product();
        let inner: usize = first.dims()[dim + 1..].iter().product();
        let total_dim: usize = tensors.iter().map(|t| t.dims()[dim]).sum();

        let mut out = Vec::with_capacity(outer * total_dim * inner);
        for o in 0..outer {
            for t in tensors {
                let chunk = t.dims()[dim] * inner;
                out.extend_from_slice(&t.data[o * chunk..(o + 1) * chunk]);
            }
        }

        let mut dims = first.dims().to_vec();
        dims[dim] = total_dim;
        Ok(Self {
            data: out.into(),
            shape: Shape::new(dims),
            dtype: first.dtype,
        })
    }

    /// Stack tensors along a new dimension.
    ///
    /// All tensors must have the same shape. `stack([a, b], 0)` where a,b are
    /// shape [2,3] gives [2, 2, 3]. Collation uses `dim = 0`.
    pub fn stack(tensors: &[Self], dim: usize) -> Result<Self> {
        let first = tensors
            .first()
            .ok_or_else(|| Error::msg("stack: empty tensor list"))?;
        for t in &tensors[1..] {
            if t.shape != first.shape {
                return Err(Error::ShapeMismatch {
                    expected: first.shape.clone(),
                    got: t.shape.clone(),
                });
            }
            if t.dtype != first.dtype {
                return Err(Error::msg(format!(
                    "stack: dtype {} does not match {}",
                    t.dtype, first.dtype
                )));
            }
        }
        if dim == 0 {
            // Contiguous records laid end to end are already the batch.
            let mut out = Vec::with_capacity(first.elem_count() * tensors.len());
            for t in tensors {
                out.extend_from_slice(&t.data);
            }
            return Ok(Self {
                data: out.into(),
                shape: first.shape.with_leading(tensors.len()),
                dtype: first.dtype,
            });
        }
        let unsqueezed: Vec<Self> = tensors
            .iter()
            .map(|t| t.unsqueeze(dim))
            .collect::<Result<Vec<_>>>()?;
        Self::cat(&unsqueezed, dim)
    }

    // Element-wise

    /// Apply `f` to every element, keeping shape and dtype.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let dtype = self.dtype;
        let data: Vec<f64> = self.data.iter().map(|&v| dtype.quantize(f(v))).collect();
        Self {
            data: data.into(),
            shape: self.shape.clone(),
            dtype,
        }
    }

    /// Convert this tensor to a different dtype.
    pub fn to_dtype(&self, dtype: DType) -> Self {
        if dtype == self.dtype {
            return self.clone();
        }
        let data: Vec<f64> = self.data.iter().map(|&v| dtype.quantize(v)).collect();
        Self {
            data: data.into(),
            shape: self.shape.clone(),
            dtype,
        }
    }

    // Data extraction

    /// Extract all elements as a flat Vec<f64>.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data.to_vec()
    }

    /// Extract a scalar value (tensor must have exactly 1 element).
    pub fn to_scalar_f64(&self) -> Result<f64> {
        if self.elem_count() != 1 {
            return Err(Error::NotAScalar {
                shape: self.shape.clone(),
            });
        }
        Ok(self.data[0])
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype && self.shape == other.shape && self.data == other.data
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor(shape={}, dtype={}", self.shape, self.dtype)?;
        if self.elem_count() <= 16 {
            write!(f, ", data={:?}", &*self.data)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_checks_count() {
        let err = Tensor::from_vec(vec![1.0, 2.0, 3.0], (2, 2), DType::F32).unwrap_err();
        assert!(matches!(err, Error::ElementCountMismatch { expected: 4, got: 3, .. }));
    }

    #[test]
    fn from_vec_quantizes() {
        let t = Tensor::from_vec(vec![1.9, 256.0], 2, DType::U8).unwrap();
        assert_eq!(t.to_f64_vec(), vec![1.0, 255.0]);
    }

    #[test]
    fn get_drops_leading_axis() {
        let t = Tensor::arange(6, DType::I64).reshape((3, 2)).unwrap();
        let row = t.get(1).unwrap();
        assert_eq!(row.dims(), &[2]);
        assert_eq!(row.to_f64_vec(), vec![2.0, 3.0]);

        let v = Tensor::arange(4, DType::I64);
        assert_eq!(v.get(3).unwrap().to_scalar_f64().unwrap(), 3.0);
        assert!(v.get(4).is_err());
    }

    #[test]
    fn narrow_middle_dim() {
        let t = Tensor::arange(24, DType::F64).reshape((2, 3, 4)).unwrap();
        let n = t.narrow(1, 1, 2).unwrap();
        assert_eq!(n.dims(), &[2, 2, 4]);
        assert_eq!(&n.to_f64_vec()[..4], &[4.0, 5.0, 6.0, 7.0]);
        assert!(t.narrow(1, 2, 2).is_err());
    }

    #[test]
    fn stack_prepends_axis() {
        let a = Tensor::from_vec(vec![0.0, 1.0], 2, DType::I64).unwrap();
        let b = Tensor::from_vec(vec![2.0, 3.0], 2, DType::I64).unwrap();
        let s = Tensor::stack(&[a, b], 0).unwrap();
        assert_eq!(s.dims(), &[2, 2]);
        assert_eq!(s.to_f64_vec(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn stack_rejects_mismatched_shapes() {
        let a = Tensor::zeros(2, DType::F32);
        let b = Tensor::zeros(3, DType::F32);
        assert!(matches!(
            Tensor::stack(&[a, b], 0),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn stack_scalars() {
        let t = Tensor::arange(3, DType::I64);
        let rows: Vec<Tensor> = (0..3).map(|i| t.get(i).unwrap()).collect();
        let s = Tensor::stack(&rows, 0).unwrap();
        assert_eq!(s, t);
    }

    #[test]
    fn cat_along_inner_dim() {
        let a = Tensor::arange(4, DType::F64).reshape((2, 2)).unwrap();
        let b = Tensor::zeros((2, 1), DType::F64);
        let c = Tensor::cat(&[a, b], 1).unwrap();
        assert_eq!(c.dims(), &[2, 3]);
        assert_eq!(c.to_f64_vec(), vec![0.0, 1.0, 0.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn permute_hwc_to_chw() {
        // H=1, W=2, C=3
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], (1, 2, 3), DType::U8).unwrap();
        let p = t.permute(&[2, 0, 1]).unwrap();
        assert_eq!(p.dims(), &[3, 1, 2]);
        assert_eq!(p.to_f64_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert!(t.permute(&[0, 0, 1]).is_err());
    }

    #[test]
    fn map_and_cast() {
        let t = Tensor::from_vec(vec![1.5, 2.5], 2, DType::F64).unwrap();
        assert_eq!(t.map(|v| v * 2.0).to_f64_vec(), vec![3.0, 5.0]);
        assert_eq!(t.to_dtype(DType::I64).to_f64_vec(), vec![1.0, 2.0]);
    }
}
