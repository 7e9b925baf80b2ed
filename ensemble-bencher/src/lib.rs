//! Benchmarks writing many small shard files in parallel and combining them
//! into one frame.

pub mod bench_result;
pub mod cleanup;
pub mod config;
pub mod container;
pub mod errors;
pub mod frame;
pub mod generator;
pub mod logging;
pub mod read_bench;
pub mod runner;
pub mod shard;
pub mod write_bench;
