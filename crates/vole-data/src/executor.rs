// Executor — the worker pool a prefetching loader submits batches to
//
// The loader never owns worker threads. The caller builds a pool, hands the
// loader a shared handle, and shuts the pool down when it is done:
//
//   let pool = Arc::new(
//       WorkerPoolConfig::new(4)
//           .on_start(|worker| runtime::init_thread_flags(worker))
//           .build()?,
//   );
//   let loader = DataLoader::new(dataset, config)?.with_executor(pool.clone());
//   for batch in &loader { ... }
//   drop(loader);
//   drop(pool); // rayon joins its threads once outstanding jobs finish
//
// Any pool that can run a boxed job works; rayon's ThreadPool is the default.

use std::sync::Arc;

use tracing::debug;
use vole_core::{Error, Result};

/// A unit of work submitted to an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Hook run once on each worker thread before it takes any job.
pub type StartHook = Arc<dyn Fn(usize) + Send + Sync>;

/// Something that runs jobs, usually on other threads.
///
/// The loader only needs fire-and-forget submission; results travel back on
/// a per-job channel, so completion order does not matter.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

impl Executor for rayon::ThreadPool {
    fn execute(&self, job: Job) {
        self.spawn(job);
    }
}

/// Runs each job on the submitting thread before returning.
///
/// Gives prefetch ordering semantics without any threads; handy in tests
/// and on targets without thread support.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Configuration for a rayon worker pool.
#[derive(Clone)]
pub struct WorkerPoolConfig {
    /// Number of worker threads (must be at least 1).
    pub num_threads: usize,
    /// Worker threads are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
    /// Per-worker initialization, e.g. thread-local runtime mode flags.
    pub on_start: Option<StartHook>,
}

impl WorkerPoolConfig {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            thread_name_prefix: "vole-data".to_string(),
            on_start: None,
        }
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn on_start(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_start = Some(Arc::new(hook));
        self
    }

    /// Build the pool. The caller owns it; dropping it shuts it down.
    pub fn build(self) -> Result<rayon::ThreadPool> {
        if self.num_threads == 0 {
            return Err(Error::InvalidConfig(
                "worker pool needs at least one thread".into(),
            ));
        }
        let prefix = self.thread_name_prefix;
        let mut builder = rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .thread_name(move |i| format!("{prefix}-{i}"));
        if let Some(hook) = self.on_start {
            builder = builder.start_handler(move |worker| {
                debug!(worker, "data worker starting");
                hook(worker);
            });
        }
        builder
            .build()
            .map_err(|e| Error::InvalidConfig(format!("worker pool: {e}")))
    }
}

impl std::fmt::Debug for WorkerPoolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPoolConfig")
            .field("num_threads", &self.num_threads)
            .field("thread_name_prefix", &self.thread_name_prefix)
            .field("on_start", &self.on_start.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn start_hook_runs_once_per_worker() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = started.clone();
        let pool = WorkerPoolConfig::new(3)
            .on_start(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        // Make every worker busy at once so all of them have started.
        let (tx, rx) = mpsc::channel();
        let barrier = Arc::new(std::sync::Barrier::new(3));
        for _ in 0..3 {
            let tx = tx.clone();
            let barrier = barrier.clone();
            pool.execute(Box::new(move || {
                barrier.wait();
                tx.send(()).unwrap();
            }));
        }
        for _ in 0..3 {
            rx.recv().unwrap();
        }
        assert_eq!(started.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn threads_are_named() {
        let pool = WorkerPoolConfig::new(1)
            .thread_name_prefix("loader")
            .build()
            .unwrap();
        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        }));
        assert_eq!(rx.recv().unwrap().as_deref(), Some("loader-0"));
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(WorkerPoolConfig::new(0).build().unwrap_err().is_configuration());
    }

    #[test]
    fn inline_runs_immediately() {
        let hit = Arc::new(AtomicUsize::new(0));
        let h = hit.clone();
        InlineExecutor.execute(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hit.load(Ordering::SeqCst), 1);
    }
}
