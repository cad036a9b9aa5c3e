// DataLoader — batching, shuffling, iteration

use std::sync::Arc;

use tracing::debug;
use vole_core::{bail, Error, Result, Tensor, TensorList};

use crate::array_dataset::ArrayDataset;
use crate::batch_sampler::{BatchIndices, BatchSampler};
use crate::dataset::{Dataset, Record};
use crate::executor::Executor;
use crate::prefetch::PrefetchIter;
use crate::sampler::SamplingOrder;

/// Configuration for the DataLoader.
#[derive(Debug, Clone)]
pub struct DataLoaderConfig {
    /// Number of records per batch.
    pub batch_size: usize,
    /// Whether to drop the last incomplete batch.
    pub drop_last: bool,
    /// Index order for each pass.
    pub order: SamplingOrder,
    /// Optional random seed; pins the permutation of every pass.
    pub seed: Option<u64>,
    /// Declared worker concurrency. 0 or 1 keeps iteration on the calling
    /// thread even when an executor is attached.
    pub num_workers: usize,
    /// Maximum batches submitted but not yet consumed when prefetching.
    pub prefetch_depth: usize,
}

impl Default for DataLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            drop_last: false,
            order: SamplingOrder::Random,
            seed: None,
            num_workers: 0,
            prefetch_depth: 2,
        }
    }
}

impl DataLoaderConfig {
    pub fn batch_size(mut self, bs: usize) -> Self {
        self.batch_size = bs;
        self
    }

    pub fn drop_last(mut self, d: bool) -> Self {
        self.drop_last = d;
        self
    }

    pub fn order(mut self, order: SamplingOrder) -> Self {
        self.order = order;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = Some(s);
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn prefetch_depth(mut self, depth: usize) -> Self {
        self.prefetch_depth = depth;
        self
    }

    /// Reject options that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidBatchSize {
                batch_size: self.batch_size,
            });
        }
        if self.prefetch_depth == 0 {
            return Err(Error::InvalidConfig(
                "prefetch depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// Batch

/// Several records collated along a new leading axis.
///
/// A batch owns its tensors; dropping it releases them. Tensor `i` of
/// `data` stacks tensor `i` of every record's data, likewise for `labels`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub data: TensorList,
    pub labels: TensorList,
    /// Dataset indices the batch was built from, in order.
    pub indices: Vec<usize>,
}

impl Batch {
    /// Number of records in the batch.
    pub fn size(&self) -> usize {
        self.indices.len()
    }
}

fn stack_field(records: &[Record], field: impl Fn(&Record) -> &TensorList) -> Result<TensorList> {
    let arity = field(&records[0]).len();
    if let Some(odd) = records.iter().position(|r| field(r).len() != arity) {
        bail!(
            "collate: record {} has {} tensors, record 0 has {}",
            odd,
            field(&records[odd]).len(),
            arity
        );
    }
    (0..arity)
        .map(|i| {
            let parts: Vec<Tensor> = records.iter().map(|r| field(r)[i].clone()).collect();
            Tensor::stack(&parts, 0)
        })
        .collect()
}

/// Collate records into a batch by stacking each field along a new axis.
pub fn collate(records: Vec<Record>, indices: Vec<usize>) -> Result<Batch> {
    if records.is_empty() {
        bail!("collate: no records");
    }
    let data = stack_field(&records, |r| &r.data)?;
    let labels = stack_field(&records, |r| &r.labels)?;
    Ok(Batch {
        data,
        labels,
        indices,
    })
}

/// Fetch every record of one batch-index-group and collate them.
///
/// The first failing `get` aborts the batch and its error is returned.
pub fn materialize(dataset: &dyn Dataset, indices: Vec<usize>) -> Result<Batch> {
    let records = indices
        .iter()
        .map(|&i| dataset.get(i))
        .collect::<Result<Vec<_>>>()?;
    collate(records, indices)
}

// DataLoader

/// A DataLoader wraps a Dataset and produces batches of tensors.
///
/// Each call to [`iter`](DataLoader::iter) starts a new pass: the batch
/// sampler draws fresh index groups, and batches are materialised either
/// on the calling thread or, with an executor attached and
/// `num_workers > 1`, on the executor with up to `prefetch_depth` batches
/// in flight. Both modes yield the same batches in the same order.
pub struct DataLoader {
    dataset: Arc<dyn Dataset>,
    sampler: BatchSampler,
    config: DataLoaderConfig,
    executor: Option<Arc<dyn Executor>>,
}

impl DataLoader {
    /// Create a loader whose batch sampler comes from `config`.
    pub fn new(dataset: Arc<dyn Dataset>, config: DataLoaderConfig) -> Result<Self> {
        config.validate()?;
        let sampler =
            BatchSampler::with_order(config.order, config.seed, config.batch_size, config.drop_last)?;
        Ok(Self::build(dataset, sampler, config))
    }

    /// Create a loader with an explicit batch sampler. The batch size,
    /// order and drop policy in `config` are ignored.
    pub fn with_sampler(
        dataset: Arc<dyn Dataset>,
        sampler: BatchSampler,
        config: DataLoaderConfig,
    ) -> Result<Self> {
        if config.prefetch_depth == 0 {
            return Err(Error::InvalidConfig(
                "prefetch depth must be at least 1".into(),
            ));
        }
        Ok(Self::build(dataset, sampler, config))
    }

    /// Iterate an [`ArrayDataset`] with the sampler it was built with.
    pub fn from_array(dataset: Arc<ArrayDataset>, config: DataLoaderConfig) -> Result<Self> {
        let sampler = dataset.sampler().clone();
        Self::with_sampler(dataset, sampler, config)
    }

    fn build(dataset: Arc<dyn Dataset>, sampler: BatchSampler, config: DataLoaderConfig) -> Self {
        debug!(
            dataset = dataset.name(),
            records = dataset.len(),
            batches = sampler.num_batches(dataset.len()),
            batch_size = sampler.batch_size(),
            drop_last = sampler.drop_last(),
            order = sampler.sampler().name(),
            "data loader created"
        );
        Self {
            dataset,
            sampler,
            config,
            executor: None,
        }
    }

    /// Materialise batches on `executor` when `num_workers > 1`.
    ///
    /// The loader only submits jobs; the caller keeps the pool alive for as
    /// long as the loader iterates and shuts it down afterwards.
    pub fn with_executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn config(&self) -> &DataLoaderConfig {
        &self.config
    }

    pub fn sampler(&self) -> &BatchSampler {
        &self.sampler
    }

    /// The number of batches per pass.
    pub fn num_batches(&self) -> usize {
        self.sampler.num_batches(self.dataset.len())
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Whether passes run on the attached executor.
    pub fn is_prefetching(&self) -> bool {
        self.executor.is_some() && self.config.num_workers > 1
    }

    /// Start a pass over the dataset.
    pub fn iter(&self) -> Batches {
        let groups = self.sampler.batches(self.dataset.len());
        let inner = match &self.executor {
            Some(executor) if self.config.num_workers > 1 => Inner::Prefetch(PrefetchIter::new(
                self.dataset.clone(),
                groups,
                executor.clone(),
                self.config.prefetch_depth,
            )),
            _ => Inner::Sequential(SequentialIter {
                dataset: self.dataset.clone(),
                groups,
                failed: false,
            }),
        };
        Batches { inner }
    }
}

impl<'a> IntoIterator for &'a DataLoader {
    type Item = Result<Batch>;
    type IntoIter = Batches;

    fn into_iter(self) -> Batches {
        self.iter()
    }
}

// Iteration

/// One single-pass sequence of batches.
///
/// Yields `Err` at most once: after an error is reported for a position,
/// iteration stops. Batches already yielded stay valid.
pub struct Batches {
    inner: Inner,
}

enum Inner {
    Sequential(SequentialIter),
    Prefetch(PrefetchIter),
}

impl Iterator for Batches {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            Inner::Sequential(it) => it.next(),
            Inner::Prefetch(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Inner::Sequential(it) => it.size_hint(),
            Inner::Prefetch(it) => it.size_hint(),
        }
    }
}

/// Materialises one batch at a time on the calling thread.
struct SequentialIter {
    dataset: Arc<dyn Dataset>,
    groups: BatchIndices,
    failed: bool,
}

impl Iterator for SequentialIter {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let indices = self.groups.next()?;
        let result = materialize(&*self.dataset, indices);
        self.failed = result.is_err();
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let n = self.groups.len();
        (0, Some(n))
    }
}
