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

//! Runs the write, read and cleanup phases in order.

use tracing::info;

use crate::bench_result::{CleanupMetrics, RunMetrics};
use crate::cleanup::remove_shard_files;
use crate::config::BenchConfig;
use crate::errors::Result;
use crate::frame::Frame;
use crate::generator::NormalGenerator;
use crate::read_bench::ReadBench;
use crate::write_bench::WriteBench;

pub struct BenchRunner {
    config: BenchConfig,
}

impl BenchRunner {
    /// Returns a new runner, fails if the config is invalid.
    pub fn new(config: BenchConfig) -> Result<BenchRunner> {
        config.validate()?;
        Ok(BenchRunner { config })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn write_bench(&self) -> WriteBench {
        let generator = NormalGenerator::new(self.config.parameters).with_seed(self.config.seed);
        WriteBench::new(
            self.config.shard_layout(),
            generator,
            self.config.ensembles,
        )
        .with_write_workers(self.config.write_workers())
        .with_properties(self.config.container.writer_properties())
        .with_progress_every(self.config.progress_every)
    }

    pub fn read_bench(&self) -> ReadBench {
        ReadBench::new(
            self.config.shard_layout(),
            self.config.ensembles,
            self.config.parameters,
        )
    }

    /// Removes all shard files under the work dir.
    pub fn cleanup(&self) -> Result<CleanupMetrics> {
        remove_shard_files(&self.config.shard_layout())
    }

    /// Runs all phases, returns the combined frame and metrics.
    ///
    /// A failed phase aborts the run and leaves the files as they are.
    pub fn run(&self) -> Result<(Frame, RunMetrics)> {
        let write = self.write_bench().run()?;
        info!("Finish writing shards, metrics: {:?}", write);

        let (frame, read) = self.read_bench().run()?;
        info!("Finish combining shards, metrics: {:?}", read);

        frame.check_shape((self.config.parameters, self.config.ensembles))?;

        let cleanup = if self.config.cleanup {
            Some(self.cleanup()?)
        } else {
            info!("Keep shard files in {}", self.config.work_dir.display());
            None
        };

        Ok((
            frame,
            RunMetrics {
                write,
                read,
                cleanup,
            },
        ))
    }
}
