// TensorList — an ordered collection of tensors
//
// Records, batches and transform steps all speak in tensor lists: an image
// record is a one-element list, a multi-input record holds one tensor per
// input, and a pipeline step takes a list and returns a list.

use std::ops::Index;

use crate::error::{Error, Result};
use crate::tensor::Tensor;

/// An ordered, owned collection of tensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorList(Vec<Tensor>);

impl TensorList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A list holding exactly one tensor.
    pub fn single(tensor: Tensor) -> Self {
        Self(vec![tensor])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, tensor: Tensor) {
        self.0.push(tensor);
    }

    pub fn get(&self, index: usize) -> Option<&Tensor> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tensor> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Tensor] {
        &self.0
    }

    /// The only tensor in the list.
    ///
    /// Fails unless the list holds exactly one tensor.
    pub fn singleton(&self) -> Result<&Tensor> {
        match self.0.as_slice() {
            [t] => Ok(t),
            other => Err(Error::msg(format!(
                "expected a single tensor, list holds {}",
                other.len()
            ))),
        }
    }

    /// Replace the tensor at `index`, returning the previous one.
    pub fn replace(&mut self, index: usize, tensor: Tensor) -> Result<Tensor> {
        let len = self.0.len();
        let slot = self
            .0
            .get_mut(index)
            .ok_or_else(|| Error::msg(format!("tensor index {index} out of range for list of {len}")))?;
        Ok(std::mem::replace(slot, tensor))
    }

    pub fn into_vec(self) -> Vec<Tensor> {
        self.0
    }
}

impl From<Vec<Tensor>> for TensorList {
    fn from(v: Vec<Tensor>) -> Self {
        Self(v)
    }
}

impl From<Tensor> for TensorList {
    fn from(t: Tensor) -> Self {
        Self::single(t)
    }
}

impl FromIterator<Tensor> for TensorList {
    fn from_iter<I: IntoIterator<Item = Tensor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TensorList {
    type Item = Tensor;
    type IntoIter = std::vec::IntoIter<Tensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TensorList {
    type Item = &'a Tensor;
    type IntoIter = std::slice::Iter<'a, Tensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Index<usize> for TensorList {
    type Output = Tensor;

    fn index(&self, index: usize) -> &Tensor {
        &self.0[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DType;

    #[test]
    fn singleton_requires_one() {
        let empty = TensorList::new();
        assert!(empty.singleton().is_err());

        let one = TensorList::single(Tensor::arange(3, DType::I64));
        assert_eq!(one.singleton().unwrap().dims(), &[3]);

        let two: TensorList = vec![Tensor::zeros(1, DType::F32), Tensor::zeros(1, DType::F32)].into();
        assert!(two.singleton().is_err());
    }

    #[test]
    fn replace_out_of_range() {
        let mut list = TensorList::single(Tensor::zeros(1, DType::F32));
        let old = list.replace(0, Tensor::arange(2, DType::F32)).unwrap();
        assert_eq!(old.dims(), &[1]);
        assert_eq!(list[0].dims(), &[2]);
        assert!(list.replace(1, Tensor::zeros(1, DType::F32)).is_err());
    }
}
