//! Removes shard files.

use std::fs;
use std::time::Instant;

use tracing::{error, info};

use crate::bench_result::CleanupMetrics;
use crate::errors::{Error, Result};
use crate::shard::ShardLayout;

/// Removes all files matching the shard naming pattern in the layout's directory.
///
/// Files are listed first, so a listed file that can't be removed (including
/// one removed by someone else in the meantime) fails the cleanup. Cleaning a
/// directory without shard files removes nothing and succeeds.
pub fn remove_shard_files(layout: &ShardLayout) -> Result<CleanupMetrics> {
    let start = Instant::now();

    let files = layout.list_files()?;
    info!(
        "Remove {} shard files in {}",
        files.len(),
        layout.dir().display()
    );

    for path in &files {
        if let Err(e) = fs::remove_file(path) {
            error!("Failed to remove {}, err: {}", path.display(), e);
            return Err(Error::io(path, e));
        }
    }

    Ok(CleanupMetrics {
        num_removed: files.len(),
        elapsed_time: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_shard_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ShardLayout::new(
            dir.path().to_path_buf(),
            "Ensemble_".to_string(),
            "h5".to_string(),
        );
        for name in ["Ensemble_0.h5", "Ensemble_1.h5", "keep.h5", "Ensemble_2.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let metrics = remove_shard_files(&layout).unwrap();
        assert_eq!(2, metrics.num_removed);
        assert!(layout.list_files().unwrap().is_empty());
        assert!(dir.path().join("keep.h5").exists());
        assert!(dir.path().join("Ensemble_2.txt").exists());

        // Cleaning again is a no-op.
        let metrics = remove_shard_files(&layout).unwrap();
        assert_eq!(0, metrics.num_removed);
    }
}
