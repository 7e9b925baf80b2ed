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

use std::fmt::{Debug, Formatter};
use std::time::Duration;

/// Metrics of the write phase.
pub struct WriteMetrics {
    pub num_shards: usize,
    /// Values written to each section.
    pub num_values: usize,
    pub num_workers: usize,
    pub elapsed_time: Duration,
}

/// Metrics of the read phase.
pub struct ReadMetrics {
    pub num_rows: usize,
    pub num_columns: usize,
    pub elapsed_time: Duration,
}

/// Metrics of the cleanup phase.
pub struct CleanupMetrics {
    pub num_removed: usize,
    pub elapsed_time: Duration,
}

/// Metrics of a whole run.
#[derive(Debug)]
pub struct RunMetrics {
    pub write: WriteMetrics,
    pub read: ReadMetrics,
    /// None if cleanup is disabled.
    pub cleanup: Option<CleanupMetrics>,
}

fn secs(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64()
}

impl Debug for WriteMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteMetrics")
            .field("num_shards", &self.num_shards)
            .field("num_values", &self.num_values)
            .field("num_workers", &self.num_workers)
            .field("elapsed_time", &secs(self.elapsed_time))
            .finish()
    }
}

impl Debug for ReadMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadMetrics")
            .field("num_rows", &self.num_rows)
            .field("num_columns", &self.num_columns)
            .field("elapsed_time", &secs(self.elapsed_time))
            .finish()
    }
}

impl Debug for CleanupMetrics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupMetrics")
            .field("num_removed", &self.num_removed)
            .field("elapsed_time", &secs(self.elapsed_time))
            .finish()
    }
}
