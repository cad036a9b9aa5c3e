// Dataset trait — unified interface for any indexable record source

use vole_core::{Error, Result, TensorList};

use crate::transform::Pipeline;

/// A single dataset element: input tensors plus optional label tensors.
///
/// Each field is a [`TensorList`] so a record can carry several inputs
/// (or several targets). Records are immutable once produced; the caller
/// that collates them into a batch takes ownership.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Input tensors, one per model input.
    pub data: TensorList,
    /// Target tensors. Empty for unlabelled data.
    pub labels: TensorList,
}

impl Record {
    pub fn new(data: TensorList, labels: TensorList) -> Self {
        Self { data, labels }
    }

    /// A record without labels.
    pub fn unlabelled(data: TensorList) -> Self {
        Self {
            data,
            labels: TensorList::new(),
        }
    }
}

/// A fixed-size, randomly indexable collection of records.
///
/// Implementations must be `Send + Sync`: a prefetching loader calls
/// [`get`](Dataset::get) from several worker threads at once. Any per-call
/// state (decoders, RNGs) must be created inside `get`, not shared through
/// a mutable cursor.
pub trait Dataset: Send + Sync {
    /// Total number of records.
    fn len(&self) -> usize;

    /// Whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve the record at position `index`.
    ///
    /// Fails with [`Error::IndexOutOfBounds`] when `index >= len()`, and
    /// with a resource error when an external record cannot be fetched.
    fn get(&self, index: usize) -> Result<Record>;

    /// Optional human-readable name.
    fn name(&self) -> &str {
        "dataset"
    }
}

/// Reject `index` unless it lies in `[0, len)`.
pub fn check_index(index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::IndexOutOfBounds { index, len });
    }
    Ok(())
}

// MapDataset — run pipelines while preparing each record

/// Wraps a dataset and applies a data pipeline (and optionally a label
/// pipeline) lazily on each `get()`.
pub struct MapDataset<D: Dataset> {
    inner: D,
    data_pipeline: Pipeline,
    label_pipeline: Pipeline,
}

impl<D: Dataset> MapDataset<D> {
    /// Apply `pipeline` to every record's data tensors.
    pub fn new(inner: D, pipeline: Pipeline) -> Self {
        Self {
            inner,
            data_pipeline: pipeline,
            label_pipeline: Pipeline::new(),
        }
    }

    /// Also apply `pipeline` to every record's labels.
    pub fn with_label_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.label_pipeline = pipeline;
        self
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Dataset> Dataset for MapDataset<D> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Result<Record> {
        let record = self.inner.get(index)?;
        let data = self.data_pipeline.apply(record.data)?;
        let labels = if record.labels.is_empty() {
            record.labels
        } else {
            self.label_pipeline.apply(record.labels)?
        };
        Ok(Record { data, labels })
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Cast, Reshape};
    use vole_core::{DType, Tensor};

    struct Squares(usize);

    impl Dataset for Squares {
        fn len(&self) -> usize {
            self.0
        }

        fn get(&self, index: usize) -> Result<Record> {
            check_index(index, self.0)?;
            let v = (index * index) as f64;
            let data = Tensor::from_vec(vec![v, v], 2, DType::F64)?;
            let label = Tensor::from_vec(vec![index as f64], (), DType::I64)?;
            Ok(Record::new(data.into(), label.into()))
        }
    }

    #[test]
    fn out_of_range_is_an_error() {
        let ds = Squares(3);
        assert!(ds.get(2).is_ok());
        assert!(matches!(
            ds.get(3),
            Err(Error::IndexOutOfBounds { index: 3, len: 3 })
        ));
    }

    #[test]
    fn map_dataset_applies_both_pipelines() {
        let mut data = Pipeline::new();
        data.add(Reshape::new(vec![1, 2]));
        let mut labels = Pipeline::new();
        labels.add(Cast::new(DType::F32));

        let ds = MapDataset::new(Squares(4), data).with_label_pipeline(labels);
        let r = ds.get(3).unwrap();
        assert_eq!(r.data[0].dims(), &[1, 2]);
        assert_eq!(r.data[0].to_f64_vec(), vec![9.0, 9.0]);
        assert_eq!(r.labels[0].dtype(), DType::F32);
        assert_eq!(ds.len(), 4);
        assert!(ds.get(4).is_err());
    }
}
