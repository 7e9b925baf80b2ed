// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use parquet::file::properties::WriterProperties;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info};

use crate::bench_result::WriteMetrics;
use crate::container::{ShardFile, PARAMETERS, RESPONSES};
use crate::errors::{Error, Result};
use crate::generator::NormalGenerator;
use crate::shard::{ShardId, ShardLayout};

/// Write benchmark, writes shards in parallel.
pub struct WriteBench {
    layout: ShardLayout,
    generator: NormalGenerator,
    num_shards: usize,
    properties: WriterProperties,
    write_workers: usize,
    progress_every: usize,
}

impl WriteBench {
    /// Creates a new write benchmark.
    pub fn new(layout: ShardLayout, generator: NormalGenerator, num_shards: usize) -> WriteBench {
        WriteBench {
            layout,
            generator,
            num_shards,
            properties: WriterProperties::builder().build(),
            write_workers: 1,
            progress_every: 0,
        }
    }

    /// Set worker number to write.
    pub fn with_write_workers(mut self, write_workers: usize) -> Self {
        self.write_workers = write_workers;
        self
    }

    pub fn with_properties(mut self, properties: WriterProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Log progress every N written shards, never log if N is 0.
    pub fn with_progress_every(mut self, progress_every: usize) -> Self {
        self.progress_every = progress_every;
        self
    }

    /// Generates and writes both sections of the shard.
    pub fn write_shard(&self, shard: ShardId) -> Result<()> {
        let file =
            ShardFile::new(self.layout.shard_path(shard)).with_properties(self.properties.clone());
        let mut rng = self.generator.rng(shard);

        let parameters = self.generator.generate(&mut rng, shard);
        let responses = self.generator.generate(&mut rng, shard);
        file.write_sections(&[(PARAMETERS, &parameters), (RESPONSES, &responses)])?;

        debug!("Write shard {} to {}", shard, file.path().display());

        Ok(())
    }

    /// Iter one bench.
    ///
    /// Returns after all shards are written, fails if any shard fails.
    pub fn run(&self) -> Result<WriteMetrics> {
        let write_workers = self.write_workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(write_workers)
            .thread_name(|i| format!("shard-writer-{i}"))
            .build()?;

        fs::create_dir_all(self.layout.dir()).map_err(|e| Error::io(self.layout.dir(), e))?;

        info!(
            "Start writing {} shards with {} workers",
            self.num_shards, write_workers
        );

        let start = Instant::now();
        let written = AtomicUsize::new(0);
        pool.install(|| {
            (0..self.num_shards)
                .into_par_iter()
                .map(ShardId)
                .try_for_each(|shard| -> Result<()> {
                    self.write_shard(shard)?;

                    let done = written.fetch_add(1, Ordering::Relaxed) + 1;
                    if self.progress_every > 0 && done % self.progress_every == 0 {
                        info!("Written {}/{} shards", done, self.num_shards);
                    }
                    Ok(())
                })
        })?;
        let elapsed_time = start.elapsed();

        Ok(WriteMetrics {
            num_shards: written.into_inner(),
            num_values: self.generator.num_values(),
            num_workers: write_workers,
            elapsed_time,
        })
    }
}
