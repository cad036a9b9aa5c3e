// Samplers — the order in which a pass visits record indices
//
// A sampler turns a dataset size into a lazy stream of indices covering
// `0..len` exactly once. Two orders exist:
//
//   SequenceSampler — 0, 1, ..., len-1, identical on every pass
//   RandomSampler   — a uniform permutation, drawn lazily, fresh per pass
//                     unless a seed pins it for replay

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A lazily produced stream of record indices for one pass.
pub type Indices = Box<dyn Iterator<Item = usize> + Send>;

/// Decides the order of data access for one pass over a dataset.
///
/// Implementations must be `Send + Sync`: a loader shares its sampler with
/// every pass it starts. Any per-pass state (a permutation cursor, an RNG)
/// belongs to the returned iterator, never to the sampler itself.
pub trait Sampler: Send + Sync {
    /// Start a pass over a dataset of `len` records.
    fn sample(&self, len: usize) -> Indices;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Samples elements sequentially, always in the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceSampler;

impl Sampler for SequenceSampler {
    fn sample(&self, len: usize) -> Indices {
        Box::new(0..len)
    }

    fn name(&self) -> &str {
        "sequence"
    }
}

/// Samples elements randomly, without replacement.
///
/// Without a seed every call to [`sample`](Sampler::sample) draws an
/// independent permutation. With a seed every pass replays the same one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSampler {
    seed: Option<u64>,
}

impl RandomSampler {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Pin the permutation so every pass yields the same order.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Sampler for RandomSampler {
    fn sample(&self, len: usize) -> Indices {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Box::new(Permutation {
            pool: (0..len).collect(),
            pos: 0,
            rng,
        })
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Incremental Fisher–Yates shuffle: each `next` fixes one more position.
struct Permutation {
    pool: Vec<usize>,
    pos: usize,
    rng: StdRng,
}

impl Iterator for Permutation {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.pos >= self.pool.len() {
            return None;
        }
        let j = self.rng.gen_range(self.pos..self.pool.len());
        self.pool.swap(self.pos, j);
        let v = self.pool[self.pos];
        self.pos += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.pool.len() - self.pos;
        (left, Some(left))
    }
}

/// Sampling order, as chosen in a loader configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingOrder {
    Sequential,
    #[default]
    Random,
}

impl SamplingOrder {
    /// Build the sampler for this order. `seed` only affects `Random`.
    pub fn sampler(self, seed: Option<u64>) -> Box<dyn Sampler> {
        match self {
            SamplingOrder::Sequential => Box::new(SequenceSampler),
            SamplingOrder::Random => Box::new(RandomSampler { seed }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_identity() {
        let v: Vec<usize> = SequenceSampler.sample(5).collect();
        assert_eq!(v, vec![0, 1, 2, 3, 4]);
        assert_eq!(SequenceSampler.sample(0).count(), 0);
    }

    #[test]
    fn random_is_a_permutation() {
        let mut v: Vec<usize> = RandomSampler::new().sample(100).collect();
        assert_eq!(v.len(), 100);
        v.sort_unstable();
        assert_eq!(v, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn random_passes_are_independent() {
        let s = RandomSampler::new();
        let a: Vec<usize> = s.sample(50).collect();
        let b: Vec<usize> = s.sample(50).collect();
        // 50! orders; a collision here means the sampler reused its state.
        assert_ne!(a, b);
    }

    #[test]
    fn seeded_passes_replay() {
        let s = RandomSampler::with_seed(7);
        let a: Vec<usize> = s.sample(30).collect();
        let b: Vec<usize> = s.sample(30).collect();
        assert_eq!(a, b);
        assert_ne!(a, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn permutation_size_hint() {
        let mut it = RandomSampler::new().sample(3);
        assert_eq!(it.size_hint(), (3, Some(3)));
        it.next();
        assert_eq!(it.size_hint(), (2, Some(2)));
    }

    #[test]
    fn order_builds_matching_sampler() {
        assert_eq!(SamplingOrder::Sequential.sampler(None).name(), "sequence");
        assert_eq!(SamplingOrder::Random.sampler(Some(1)).name(), "random");
    }
}
