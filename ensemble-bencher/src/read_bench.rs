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

//! Read benchmark, combines a section of all shards into one frame.

use std::time::Instant;

use tracing::info;

use crate::bench_result::ReadMetrics;
use crate::container::{Section, ShardFile, PARAMETERS};
use crate::errors::Result;
use crate::frame::Frame;
use crate::shard::{ShardId, ShardLayout};

pub struct ReadBench {
    layout: ShardLayout,
    num_shards: usize,
    num_rows: usize,
    section: String,
}

impl ReadBench {
    /// Returns a new bench reading the parameters section.
    pub fn new(layout: ShardLayout, num_shards: usize, num_rows: usize) -> ReadBench {
        ReadBench {
            layout,
            num_shards,
            num_rows,
            section: PARAMETERS.to_string(),
        }
    }

    /// Reads another section instead of the parameters section.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Reads the section of the shard.
    pub fn read_shard(&self, shard: ShardId) -> Result<Section> {
        ShardFile::new(self.layout.shard_path(shard)).read_section(&self.section)
    }

    /// Iter one bench.
    ///
    /// Shards are read one by one in id order and joined to the frame.
    pub fn run(&self) -> Result<(Frame, ReadMetrics)> {
        info!(
            "Start combining section {} of {} shards",
            self.section, self.num_shards
        );

        let start = Instant::now();
        let mut frame = Frame::with_rows(self.num_rows);
        for id in 0..self.num_shards {
            let section = self.read_shard(ShardId(id))?;
            frame.join(section)?;
        }
        let elapsed_time = start.elapsed();

        let (num_rows, num_columns) = frame.shape();
        let metrics = ReadMetrics {
            num_rows,
            num_columns,
            elapsed_time,
        };

        Ok((frame, metrics))
    }
}
