// ArrayDataset — records sliced from in-memory tensors
//
// Backed by one or more data tensors and zero or more label tensors that
// share a leading dimension. Record `i` is row `i` of every backing tensor:
//
//   data   = arange(200).reshape(100, 2)   ->  record 7 data  = [14, 15]
//   labels = arange(100)                   ->  record 7 label = 7
//
// The dataset also carries the BatchSampler it should be iterated with, so
// `sequence(L)` gives contiguous windows [0,L), [L,2L), ... with a shorter
// final window, and `random(L)` gives shuffled batches of L.

use vole_core::{Error, Result, Tensor, TensorList};

use crate::batch_sampler::BatchSampler;
use crate::dataset::{check_index, Dataset, Record};

/// A dataset whose records are rows of in-memory tensors.
#[derive(Debug, Clone)]
pub struct ArrayDataset {
    data: TensorList,
    labels: TensorList,
    len: usize,
    sampler: BatchSampler,
}

impl ArrayDataset {
    /// Build a dataset from data tensors, label tensors (may be empty) and
    /// the sampler that iteration should use.
    ///
    /// Fails if no data tensor is given, a tensor is a scalar, or the
    /// tensors disagree on their leading dimension.
    pub fn new(
        data: impl Into<TensorList>,
        labels: impl Into<TensorList>,
        sampler: BatchSampler,
    ) -> Result<Self> {
        let data = data.into();
        let labels = labels.into();
        let first = data
            .get(0)
            .ok_or_else(|| Error::InvalidConfig("array dataset needs a data tensor".into()))?;
        let len = first.shape().leading()?;

        for t in data.iter().chain(labels.iter()) {
            let rows = t.shape().leading()?;
            if rows != len {
                return Err(Error::InvalidConfig(format!(
                    "array dataset tensors disagree on record count: {} vs {}",
                    len, rows
                )));
            }
        }

        Ok(Self {
            data,
            labels,
            len,
            sampler,
        })
    }

    /// Contiguous windows of `sequence_length` records, keeping the short
    /// final window.
    pub fn sequence(
        data: impl Into<TensorList>,
        labels: impl Into<TensorList>,
        sequence_length: usize,
    ) -> Result<Self> {
        Self::new(data, labels, BatchSampler::sequential(sequence_length, false)?)
    }

    /// Shuffled batches of `batch_size` records, keeping the short final batch.
    pub fn random(
        data: impl Into<TensorList>,
        labels: impl Into<TensorList>,
        batch_size: usize,
    ) -> Result<Self> {
        Self::new(data, labels, BatchSampler::random(batch_size, false)?)
    }

    /// The sampler this dataset should be iterated with.
    pub fn sampler(&self) -> &BatchSampler {
        &self.sampler
    }

    pub fn data(&self) -> &TensorList {
        &self.data
    }

    pub fn labels(&self) -> &TensorList {
        &self.labels
    }

    fn rows(tensors: &TensorList, index: usize) -> Result<TensorList> {
        tensors.iter().map(|t| t.get(index)).collect::<Result<Vec<Tensor>>>().map(Into::into)
    }
}

impl Dataset for ArrayDataset {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> Result<Record> {
        check_index(index, self.len)?;
        Ok(Record {
            data: Self::rows(&self.data, index)?,
            labels: Self::rows(&self.labels, index)?,
        })
    }

    fn name(&self) -> &str {
        "array"
    }
}
