//! Shard identifiers and the naming of shard files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Error, Result};

/// Identifier of a shard (ensemble member).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardId(pub usize);

impl ShardId {
    /// Label of the column the shard contributes to a section.
    pub fn label(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ShardId {
    fn from(id: usize) -> ShardId {
        ShardId(id)
    }
}

/// Maps shards to files under a directory.
///
/// The file of shard `i` is `<dir>/<prefix><i>.<extension>`. Distinct shards
/// always map to distinct files, so writers of different shards never share
/// a file.
#[derive(Debug, Clone)]
pub struct ShardLayout {
    dir: PathBuf,
    prefix: String,
    extension: String,
}

impl ShardLayout {
    pub fn new(dir: PathBuf, prefix: String, extension: String) -> ShardLayout {
        ShardLayout {
            dir,
            prefix,
            extension,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file name of the shard.
    pub fn file_name(&self, shard: ShardId) -> String {
        format!("{}{}.{}", self.prefix, shard, self.extension)
    }

    /// Returns the path to the shard file.
    pub fn shard_path(&self, shard: ShardId) -> PathBuf {
        self.dir.join(self.file_name(shard))
    }

    /// Returns true if the file name matches `<prefix>*.<extension>`.
    pub fn matches(&self, file_name: &str) -> bool {
        let Some(rest) = file_name.strip_prefix(&self.prefix) else {
            return false;
        };
        let Some(stem) = rest.strip_suffix(&self.extension) else {
            return false;
        };
        stem.ends_with('.')
    }

    /// Lists files in the directory matching the shard naming pattern, sorted by path.
    ///
    /// A missing directory has no shard files.
    pub fn list_files(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.dir, e)),
        };

        let mut res = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.dir, e))?;
            let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
            if !file_type.is_file() {
                continue;
            }
            if entry.file_name().to_str().is_some_and(|name| self.matches(name)) {
                res.push(entry.path());
            }
        }
        res.sort();
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn default_layout(dir: &Path) -> ShardLayout {
        ShardLayout::new(dir.to_path_buf(), "Ensemble_".to_string(), "h5".to_string())
    }

    #[test]
    fn test_shard_file_name() {
        let layout = default_layout(Path::new("."));
        assert_eq!("Ensemble_0.h5", layout.file_name(ShardId(0)));
        assert_eq!("Ensemble_42.h5", layout.file_name(ShardId(42)));
        assert_eq!(
            Path::new("./Ensemble_7.h5"),
            layout.shard_path(ShardId(7)).as_path()
        );
        assert_eq!("3", ShardId(3).label());
    }

    #[test]
    fn test_shard_paths_disjoint() {
        let layout = default_layout(Path::new("/tmp"));
        let paths: HashSet<_> = (0..10000).map(|i| layout.shard_path(ShardId(i))).collect();
        assert_eq!(10000, paths.len());
    }

    #[test]
    fn test_matches() {
        let layout = default_layout(Path::new("."));
        assert!(layout.matches("Ensemble_0.h5"));
        assert!(layout.matches("Ensemble_123.h5"));
        assert!(layout.matches("Ensemble_.h5"));
        assert!(layout.matches("Ensemble_old.h5"));
        assert!(!layout.matches("Ensemble_0.h5.tmp"));
        assert!(!layout.matches("Ensemble_0h5"));
        assert!(!layout.matches("ensemble_0.h5"));
        assert!(!layout.matches("Ensemble_0.parquet"));
        assert!(!layout.matches("Other_0.h5"));
    }

    #[test]
    fn test_list_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = default_layout(dir.path());
        for name in ["Ensemble_1.h5", "Ensemble_0.h5", "notes.txt", "Ensemble_2.csv"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("Ensemble_9.h5")).unwrap();

        let files = layout.list_files().unwrap();
        assert_eq!(
            vec![dir.path().join("Ensemble_0.h5"), dir.path().join("Ensemble_1.h5")],
            files
        );
    }

    #[test]
    fn test_list_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = default_layout(&dir.path().join("missing"));
        assert!(layout.list_files().unwrap().is_empty());
    }
}
