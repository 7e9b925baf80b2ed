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

//! Benchmark configs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use serde::{de, Deserialize};

use crate::errors::{Error, Result};
use crate::shard::ShardLayout;

/// Config for the ensemble benchmark.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Number of ensembles (shards) to write.
    pub ensembles: usize,
    /// Number of parameters (rows) in each section.
    pub parameters: usize,
    /// Directory the shard files are written to.
    pub work_dir: PathBuf,
    pub file_prefix: String,
    pub file_extension: String,
    /// Worker number of the write pool. Uses available parallelism if it is 0.
    pub write_workers: usize,
    /// Seed of the data generator, generates random data if it is not set.
    pub seed: Option<u64>,
    /// Log progress every N written shards. Never log progress if N is 0.
    pub progress_every: usize,
    /// Remove shard files after reading them.
    pub cleanup: bool,
    /// Log level if `RUST_LOG` is not set.
    pub log_level: String,
    pub container: ContainerConfig,
    pub criterion: CriterionConfig,
}

impl Default for BenchConfig {
    fn default() -> BenchConfig {
        BenchConfig {
            ensembles: 100,
            parameters: 100000,
            work_dir: PathBuf::from("."),
            file_prefix: "Ensemble_".to_string(),
            file_extension: "h5".to_string(),
            write_workers: 0,
            seed: None,
            progress_every: 0,
            cleanup: true,
            log_level: "info".to_string(),
            container: ContainerConfig::default(),
            criterion: CriterionConfig::default(),
        }
    }
}

impl BenchConfig {
    pub fn parse_toml(path: impl AsRef<Path>) -> Result<BenchConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        toml::from_str(&content).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Checks the config before running.
    pub fn validate(&self) -> Result<()> {
        if self.ensembles == 0 {
            return Err(Error::InvalidConfig("ensembles must be positive".to_string()));
        }
        if self.parameters == 0 {
            return Err(Error::InvalidConfig("parameters must be positive".to_string()));
        }
        // Shard files live directly under the work dir.
        if self.file_prefix.is_empty() || self.file_prefix.contains(std::path::is_separator) {
            return Err(Error::InvalidConfig(format!(
                "invalid file_prefix {:?}",
                self.file_prefix
            )));
        }
        if self.file_extension.is_empty() || self.file_extension.contains(std::path::is_separator)
        {
            return Err(Error::InvalidConfig(format!(
                "invalid file_extension {:?}",
                self.file_extension
            )));
        }
        Ok(())
    }

    /// Returns the layout of shard files.
    pub fn shard_layout(&self) -> ShardLayout {
        ShardLayout::new(
            self.work_dir.clone(),
            self.file_prefix.clone(),
            self.file_extension.clone(),
        )
    }

    /// Returns worker number of the write pool.
    pub fn write_workers(&self) -> usize {
        if self.write_workers > 0 {
            return self.write_workers;
        }

        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Shard file (container) config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    #[serde(deserialize_with = "deserialize_compression")]
    pub compression: Option<Compression>,
    pub max_row_group_size: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        ContainerConfig {
            compression: None,
            max_row_group_size: 1024 * 1024,
        }
    }
}

impl ContainerConfig {
    /// Returns properties to write a shard file.
    pub fn writer_properties(&self) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_max_row_group_size(self.max_row_group_size.max(1));
        if let Some(compression) = self.compression {
            builder = builder.set_compression(compression);
        }
        builder.build()
    }
}

/// Criterion group config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CriterionConfig {
    #[serde(with = "humantime_serde")]
    pub measurement_time: Option<Duration>,
    pub sample_size: Option<usize>,
}

fn deserialize_compression<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Compression>, D::Error>
where
    D: de::Deserializer<'de>,
{
    let s: String = de::Deserialize::deserialize(deserializer)?;
    if s.is_empty() {
        return Ok(None);
    }
    let compression = if s.eq_ignore_ascii_case("uncompressed") {
        Compression::UNCOMPRESSED
    } else if s.eq_ignore_ascii_case("snappy") {
        Compression::SNAPPY
    } else if s.eq_ignore_ascii_case("lz4_raw") {
        Compression::LZ4_RAW
    } else if s.eq_ignore_ascii_case("zstd") {
        Compression::ZSTD(ZstdLevel::default())
    } else {
        return Err(de::Error::custom(format!("Unrecognized compression: {}", s)));
    };
    Ok(Some(compression))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config: BenchConfig = toml::from_str("").unwrap();
        assert_eq!(100, config.ensembles);
        assert_eq!(100000, config.parameters);
        assert_eq!("Ensemble_", config.file_prefix);
        assert_eq!("h5", config.file_extension);
        assert!(config.cleanup);
        assert_eq!(None, config.container.compression);
        config.validate().unwrap();
    }

    #[test]
    fn test_deserialize_config() {
        let s = r#"ensembles = 3
parameters = 5
work_dir = "/tmp/ensemble-bencher"
write_workers = 2
seed = 42
progress_every = 1
cleanup = false

[container]
compression = "ZSTD"

[criterion]
measurement_time = "30s"
sample_size = 10
"#;
        let config: BenchConfig = toml::from_str(s).unwrap();
        assert_eq!(3, config.ensembles);
        assert_eq!(5, config.parameters);
        assert_eq!(PathBuf::from("/tmp/ensemble-bencher"), config.work_dir);
        assert_eq!(2, config.write_workers());
        assert_eq!(Some(42), config.seed);
        assert!(!config.cleanup);
        assert_eq!(
            Some(Compression::ZSTD(ZstdLevel::default())),
            config.container.compression
        );
        assert_eq!(
            Some(Duration::from_secs(30)),
            config.criterion.measurement_time
        );
        assert_eq!(Some(10), config.criterion.sample_size);
    }

    #[test]
    fn test_unknown_compression() {
        let s = r#"[container]
compression = "rar"
"#;
        let err = toml::from_str::<BenchConfig>(s).unwrap_err();
        assert!(err.to_string().contains("Unrecognized compression"));
    }

    #[test]
    fn test_validate_config() {
        let config = BenchConfig {
            ensembles: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = BenchConfig {
            file_extension: "".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = BenchConfig {
            file_extension: "d/h5".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = BenchConfig {
            file_prefix: "sub/Ensemble_".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_write_workers_default() {
        let config = BenchConfig::default();
        assert!(config.write_workers() >= 1);
    }

    #[test]
    fn test_parse_missing_toml() {
        let err = BenchConfig::parse_toml("/path/not/exists/bench-config.toml").unwrap_err();
        assert!(err.is_not_found());
    }
}
