//! Synthetic data generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::container::Section;
use crate::shard::ShardId;

/// Generates standard normal distributed sections for shards.
#[derive(Debug, Clone)]
pub struct NormalGenerator {
    num_values: usize,
    seed: Option<u64>,
}

impl NormalGenerator {
    pub fn new(num_values: usize) -> NormalGenerator {
        NormalGenerator {
            num_values,
            seed: None,
        }
    }

    /// Makes the generated data deterministic. Shard `i` uses `seed + i`.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn num_values(&self) -> usize {
        self.num_values
    }

    /// Returns a new rng for the shard.
    pub fn rng(&self, shard: ShardId) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(shard.0 as u64)),
            None => StdRng::from_entropy(),
        }
    }

    /// Generates a section labeled by the shard.
    pub fn generate<R: Rng>(&self, rng: &mut R, shard: ShardId) -> Section {
        let values: Vec<f64> = rng
            .sample_iter(StandardNormal)
            .take(self.num_values)
            .collect();
        Section::new(shard.label(), values)
    }
}
