// BatchSampler — group a pass's indices into batch-sized chunks
//
// Consumes the wrapped sampler's indices in order, emitting a group every
// `batch_size` indices. A trailing partial group is emitted when
// `drop_last` is false and discarded when it is true, so a dataset smaller
// than one batch yields no groups at all under `drop_last`.

use std::fmt;
use std::sync::Arc;

use vole_core::{Error, Result};

use crate::sampler::{Indices, RandomSampler, Sampler, SamplingOrder, SequenceSampler};

/// Groups sampler output into batch-index-groups.
///
/// Cloning is cheap; the wrapped sampler is shared.
#[derive(Clone)]
pub struct BatchSampler {
    sampler: Arc<dyn Sampler>,
    batch_size: usize,
    drop_last: bool,
}

impl BatchSampler {
    /// Wrap `sampler`, rejecting a zero batch size.
    pub fn new(sampler: impl Sampler + 'static, batch_size: usize, drop_last: bool) -> Result<Self> {
        Self::from_arc(Arc::new(sampler), batch_size, drop_last)
    }

    pub fn from_arc(sampler: Arc<dyn Sampler>, batch_size: usize, drop_last: bool) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidBatchSize { batch_size });
        }
        Ok(Self {
            sampler,
            batch_size,
            drop_last,
        })
    }

    /// Sequential order, windows `[0,B), [B,2B), ...`.
    pub fn sequential(batch_size: usize, drop_last: bool) -> Result<Self> {
        Self::new(SequenceSampler, batch_size, drop_last)
    }

    /// Fresh random order on every pass.
    pub fn random(batch_size: usize, drop_last: bool) -> Result<Self> {
        Self::new(RandomSampler::new(), batch_size, drop_last)
    }

    /// Build from a sampling order and optional replay seed.
    pub fn with_order(
        order: SamplingOrder,
        seed: Option<u64>,
        batch_size: usize,
        drop_last: bool,
    ) -> Result<Self> {
        Self::from_arc(Arc::from(order.sampler(seed)), batch_size, drop_last)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn drop_last(&self) -> bool {
        self.drop_last
    }

    pub fn sampler(&self) -> &dyn Sampler {
        &*self.sampler
    }

    /// Number of groups one pass over `len` records produces.
    pub fn num_batches(&self, len: usize) -> usize {
        if self.drop_last {
            len / self.batch_size
        } else {
            len.div_ceil(self.batch_size)
        }
    }

    /// Start a pass over a dataset of `len` records.
    pub fn batches(&self, len: usize) -> BatchIndices {
        BatchIndices {
            indices: self.sampler.sample(len),
            batch_size: self.batch_size,
            drop_last: self.drop_last,
            remaining: self.num_batches(len),
        }
    }
}

impl fmt::Debug for BatchSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchSampler")
            .field("sampler", &self.sampler.name())
            .field("batch_size", &self.batch_size)
            .field("drop_last", &self.drop_last)
            .finish()
    }
}

/// The batch-index-groups of one pass, produced lazily.
pub struct BatchIndices {
    indices: Indices,
    batch_size: usize,
    drop_last: bool,
    remaining: usize,
}

impl Iterator for BatchIndices {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let mut group = Vec::with_capacity(self.batch_size.min(4096));
        for index in self.indices.by_ref() {
            group.push(index);
            if group.len() == self.batch_size {
                break;
            }
        }
        if group.is_empty() || (self.drop_last && group.len() < self.batch_size) {
            self.remaining = 0;
            return None;
        }
        self.remaining = self.remaining.saturating_sub(1);
        Some(group)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BatchIndices {}
