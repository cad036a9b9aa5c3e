//! # vole-data
//!
//! Dataset iteration for Vole: sampling, batching, transforms and
//! prefetching.
//!
//! This crate provides:
//! - [`Dataset`] trait — indexed records of data and label tensors
//! - [`Sampler`] / [`BatchSampler`] — sequential or random index order,
//!   grouped into batches with a drop-last policy
//! - [`Pipeline`] — ordered transforms applied to a record's tensors
//! - [`ArrayDataset`] — in-memory dataset sliced along the leading axis
//! - [`DataLoader`] — ordered batch iteration, optionally prefetched on a
//!   caller-owned [`Executor`] with a bounded number of batches in flight
//! - [`ImageTranslator`] — single-image pre-processing for inference
//   - Image augmentation transforms — RandomHorizontalFlip, RandomCrop
//   - Image decoding through the `image` crate (feature `image`)

pub mod array_dataset;
pub mod augment;
pub mod batch_sampler;
pub mod dataset;
pub mod executor;
pub mod image;
pub mod loader;
pub mod prefetch;
pub mod sampler;
pub mod transform;
pub mod translator;

pub use array_dataset::ArrayDataset;
pub use augment::{RandomCrop, RandomHorizontalFlip};
pub use batch_sampler::{BatchIndices, BatchSampler};
pub use dataset::{check_index, Dataset, MapDataset, Record};
pub use executor::{Executor, InlineExecutor, Job, StartHook, WorkerPoolConfig};
pub use image::{Flag, Image};
pub use loader::{collate, materialize, Batch, Batches, DataLoader, DataLoaderConfig};
pub use prefetch::PrefetchIter;
pub use sampler::{Indices, RandomSampler, Sampler, SamplingOrder, SequenceSampler};
pub use transform::{
    Cast, CenterCrop, Normalize, OneHot, Pipeline, Reshape, Resize, TensorOp, ToTensor, Transform,
};
pub use translator::{ImageTranslator, ImageTranslatorConfig};
