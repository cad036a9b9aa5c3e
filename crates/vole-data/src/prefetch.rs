// PrefetchIter — in-order batch prefetching on a caller-owned executor
//
// Each batch-index-group becomes one job on the executor. The iterator keeps
// a FIFO of per-job result channels in submission order and always waits
// on the oldest, so batches reach the consumer in the order their groups
// were drawn even when later jobs finish first:
//
//   pending: [ #4 (running) | #5 (done) | #6 (done) ]  <- next() waits on #4
//
// At most `depth` jobs are pending at once. New groups are submitted only
// from `next`, so a consumer that stops pulling stops submission too.
//
// Dropping the iterator drops every pending receiver. Finished batches
// still buffered in those channels are freed with them; a job that finishes
// later finds its receiver gone and drops its batch on the worker.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;

use tracing::{debug, trace, warn};
use vole_core::{Error, Result};

use crate::batch_sampler::BatchIndices;
use crate::dataset::Dataset;
use crate::executor::Executor;
use crate::loader::{materialize, Batch};

/// A submitted batch: its position in the pass and where its result lands.
struct Pending {
    position: usize,
    rx: mpsc::Receiver<Result<Batch>>,
}

/// Yields batches materialised on an executor, in submission order.
pub struct PrefetchIter {
    dataset: Arc<dyn Dataset>,
    groups: BatchIndices,
    executor: Arc<dyn Executor>,
    depth: usize,
    pending: VecDeque<Pending>,
    submitted: usize,
    done: bool,
}

impl PrefetchIter {
    pub(crate) fn new(
        dataset: Arc<dyn Dataset>,
        groups: BatchIndices,
        executor: Arc<dyn Executor>,
        depth: usize,
    ) -> Self {
        debug!(batches = groups.len(), depth, "prefetch pass starting");
        Self {
            dataset,
            groups,
            executor,
            depth: depth.max(1),
            pending: VecDeque::with_capacity(depth.max(1)),
            submitted: 0,
            done: false,
        }
    }

    /// Submit groups until `depth` batches are in flight or the pass runs out.
    fn fill(&mut self) {
        while self.pending.len() < self.depth {
            let Some(indices) = self.groups.next() else {
                break;
            };
            let position = self.submitted;
            let (tx, rx) = mpsc::sync_channel(1);
            let dataset = self.dataset.clone();

            self.executor.execute(Box::new(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    materialize(&*dataset, indices)
                }))
                .unwrap_or_else(|payload| {
                    Err(Error::Worker(format!(
                        "batch {position} panicked: {}",
                        panic_message(&*payload)
                    )))
                });
                if tx.send(result).is_err() {
                    trace!(position, "consumer gone, dropping batch");
                }
            }));

            self.pending.push_back(Pending { position, rx });
            self.submitted += 1;
            trace!(position, in_flight = self.pending.len(), "batch submitted");
        }
    }

    /// Stop the pass, releasing everything still in flight.
    fn abort(&mut self) {
        self.done = true;
        if !self.pending.is_empty() {
            debug!(discarded = self.pending.len(), "prefetch pass stopped early");
            self.pending.clear();
        }
    }
}

impl Iterator for PrefetchIter {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.fill();
        let Some(Pending { position, rx }) = self.pending.pop_front() else {
            self.done = true;
            return None;
        };

        match rx.recv() {
            Ok(Ok(batch)) => {
                trace!(position, in_flight = self.pending.len(), "batch consumed");
                Some(Ok(batch))
            }
            Ok(Err(e)) => {
                warn!(position, error = %e, "batch failed");
                self.abort();
                Some(Err(e))
            }
            Err(_) => {
                self.abort();
                Some(Err(Error::Worker(format!(
                    "batch {position} was dropped by the executor"
                ))))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        (0, Some(self.pending.len() + self.groups.len()))
    }
}

impl Drop for PrefetchIter {
    fn drop(&mut self) {
        if !self.done {
            self.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
